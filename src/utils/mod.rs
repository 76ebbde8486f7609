//! Utility modules for the asset pipeline.

pub mod exec;
pub mod httpdate;
pub mod mime;
pub mod path;
