pub mod assets;
pub mod libraries;
pub mod precache;
pub mod serve;

pub use assets::AssetsConfig;
pub use libraries::LibrariesConfig;
pub use precache::{PrecacheConfig, PrecacheMode};
pub use serve::ServeConfig;
