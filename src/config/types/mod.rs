pub mod error;
pub mod handle;

pub use error::ConfigError;
pub use handle::{cfg, init_config};
