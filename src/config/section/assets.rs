//! `[assets]` section configuration.
//!
//! Describes the application's own asset tree and its entry points.
//!
//! # Example
//!
//! ```toml
//! [assets]
//! app_root = "public"         # Document root served to browsers
//! source_files = [            # Entry points, scanned for directives in order
//!     "public/javascripts/application.js",
//!     "public/javascripts/*.js",
//! ]
//! path_prefix = ""            # Prepended to generated asset URIs
//! ```
//!
//! `source_files` entries are glob patterns relative to the project root.
//! Their order matters: earlier patterns contribute to the manifest first.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Application asset settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Document root for the application's own assets.
    /// Asset URIs are rooted here.
    pub app_root: PathBuf,

    /// Glob patterns selecting entry-point source files, in precedence order.
    pub source_files: Vec<String>,

    /// Prefix prepended to every generated asset URI, e.g. `/myapp`.
    pub path_prefix: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            app_root: PathBuf::from("public"),
            source_files: vec![
                "public/javascripts/application.js".to_string(),
                "public/javascripts/*.js".to_string(),
            ],
            path_prefix: String::new(),
        }
    }
}
