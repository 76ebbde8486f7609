//! `[precache]` section configuration.
//!
//! Controls bundle generation and compression for production serving.
//!
//! # Example
//!
//! ```toml
//! [precache]
//! mode = "compress"                                # off | bundle | compress
//! js_command = ["esbuild", "--minify", "--loader=js"]
//! css_command = ["esbuild", "--minify", "--loader=css"]
//! timeout_secs = 30
//! ```
//!
//! Compressors read the bundle on stdin and write the result to stdout.
//! Any compressor failure falls back to the uncompressed bundle.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bundle::AssetType;

/// What the precache step does with the resolved manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecacheMode {
    /// No bundles are written. Assets are served individually.
    Off,
    /// Concatenated bundles are written to the app root.
    Bundle,
    /// Bundles are written and piped through the external compressor.
    Compress,
}

/// Bundle and compression settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrecacheConfig {
    pub mode: PrecacheMode,

    /// Command line for compressing JavaScript bundles (stdin to stdout).
    pub js_command: Vec<String>,

    /// Command line for compressing CSS bundles (stdin to stdout).
    pub css_command: Vec<String>,

    /// Seconds before a hung compressor is killed.
    pub timeout_secs: u64,
}

impl Default for PrecacheConfig {
    fn default() -> Self {
        Self {
            mode: PrecacheMode::Off,
            js_command: vec![
                "esbuild".to_string(),
                "--minify".to_string(),
                "--loader=js".to_string(),
            ],
            css_command: vec![
                "esbuild".to_string(),
                "--minify".to_string(),
                "--loader=css".to_string(),
            ],
            timeout_secs: 30,
        }
    }
}

impl PrecacheConfig {
    /// Whether bundles should be written at all.
    pub fn enabled(&self) -> bool {
        self.mode != PrecacheMode::Off
    }

    /// Whether written bundles should also be compressed.
    pub fn compress(&self) -> bool {
        self.mode == PrecacheMode::Compress
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The compressor command for the given asset type.
    pub fn command_for(&self, kind: AssetType) -> &[String] {
        match kind {
            AssetType::Script => &self.js_command,
            AssetType::Style => &self.css_command,
        }
    }
}
