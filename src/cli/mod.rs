//! Command-line interface module.

mod args;
pub mod check;
pub mod manifest;
pub mod precache;
pub mod serve;

pub use args::{Cli, Commands};
