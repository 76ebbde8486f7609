//! `[libraries]` section configuration.
//!
//! Controls where reusable asset libraries are discovered.
//!
//! # Example
//!
//! ```toml
//! [libraries]
//! search_paths = ["vendor", "~/src/shared-widgets"]
//! asset_roots = ["*/assets"]               # Library asset roots, per search path
//! files = ["*/assets/javascripts/*.js"]    # Files registered by library name
//! ```
//!
//! `search_paths` entries may use `~` for the home directory. `asset_roots`
//! and `files` are glob patterns applied within each search path.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Library discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrariesConfig {
    /// Directories searched for libraries, in precedence order.
    /// Earlier paths win when two libraries share a name.
    pub search_paths: Vec<PathBuf>,

    /// Glob patterns selecting each library's asset root directory.
    pub asset_roots: Vec<String>,

    /// Glob patterns selecting the files registered under library names
    /// for `<name>` references.
    pub files: Vec<String>,
}

impl Default for LibrariesConfig {
    fn default() -> Self {
        Self {
            search_paths: vec![PathBuf::from("vendor")],
            asset_roots: vec!["*/assets".to_string()],
            files: vec!["*/assets/javascripts/*.js".to_string()],
        }
    }
}
