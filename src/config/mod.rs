//! Pipeline configuration management for `bundla.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── assets     # [assets]
//! │   ├── libraries  # [libraries]
//! │   ├── precache   # [precache]
//! │   └── serve      # [serve]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError
//! │   └── handle     # Global config handle
//! └── mod.rs         # PipelineConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section       | Purpose                                           |
//! |---------------|---------------------------------------------------|
//! | `[assets]`    | App document root, entry globs, URI prefix        |
//! | `[libraries]` | Library search paths and discovery globs          |
//! | `[precache]`  | Bundle mode and external compressor commands      |
//! | `[serve]`     | Development server (port, interface)              |

pub mod section;
pub mod types;
mod util;

use util::{find_config_file, pattern_within};

// Re-export from section/
pub use section::{AssetsConfig, LibrariesConfig, PrecacheConfig, PrecacheMode, ServeConfig};

// Re-export from types/
pub use types::{ConfigError, cfg, init_config};

use crate::{
    cli::{Cli, Commands},
    log,
    resolver::Resolver,
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing bundla.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Application asset settings
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Library discovery settings
    #[serde(default)]
    pub libraries: LibrariesConfig,

    /// Bundle and compression settings
    #[serde(default)]
    pub precache: PrecacheConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            config_path: PathBuf::new(),
            root: PathBuf::new(),
            assets: AssetsConfig::default(),
            libraries: LibrariesConfig::default(),
            precache: PrecacheConfig::default(),
            serve: ServeConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd to find the config file. The project root
    /// is determined by the config file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = match find_config_file(&cli.config) {
            Some(path) => path,
            None => {
                log!(
                    "error";
                    "Config file '{}' not found in this directory or any parent.",
                    cli.config.display()
                );
                std::process::exit(1);
            }
        };

        let mut config = Self::from_path(&config_path)?;

        // Validate raw paths before normalization makes them absolute
        config.validate_patterns()?;

        config.config_path = config_path;
        config.finalize(cli);
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        self.normalize_paths(&root);
        self.apply_command_options(cli);
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Join a path with the root directory.
    pub fn root_join(&self, path: impl AsRef<Path>) -> PathBuf {
        self.root.join(path)
    }

    /// Build the dependency resolver from this configuration.
    ///
    /// Glob patterns stay relative; directories are the absolute paths
    /// produced by `normalize_paths`.
    pub fn resolver(&self) -> Resolver {
        Resolver {
            project_root: self.root.clone(),
            app_root: self.assets.app_root.clone(),
            source_globs: self.assets.source_files.clone(),
            search_paths: self.libraries.search_paths.clone(),
            library_root_globs: self.libraries.asset_roots.clone(),
            library_globs: self.libraries.files.clone(),
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        match &cli.command {
            Commands::Serve { interface, port } => {
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
            }
            Commands::Precache { compress } => {
                if *compress {
                    self.precache.mode = PrecacheMode::Compress;
                } else if !self.precache.enabled() {
                    self.precache.mode = PrecacheMode::Bundle;
                }
            }
            Commands::Check | Commands::Manifest => {}
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all paths relative to root directory.
    fn normalize_paths(&mut self, root: &Path) {
        let root = crate::utils::path::normalize_path(root);

        self.config_path = crate::utils::path::normalize_path(&self.config_path);
        self.assets.app_root =
            crate::utils::path::normalize_path(&root.join(&self.assets.app_root));
        self.libraries.search_paths = self
            .libraries
            .search_paths
            .iter()
            .map(|p| Self::normalize_search_path(p, &root))
            .collect();

        self.root = root;
    }

    /// Normalize a search path with tilde expansion.
    fn normalize_search_path(path: &Path, root: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path.to_str().unwrap_or_default()).into_owned();
        let path = PathBuf::from(expanded);
        let full_path = if path.is_relative() {
            root.join(&path)
        } else {
            path
        };
        crate::utils::path::normalize_path(&full_path)
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Pre-validate glob patterns before normalization.
    ///
    /// This must run before `finalize()`: normalization converts
    /// `assets.app_root` to an absolute path, after which relative
    /// `source_files` patterns can no longer be compared against it.
    fn validate_patterns(&self) -> Result<()> {
        if self.assets.app_root.is_absolute() {
            return Err(ConfigError::Validation(format!(
                "assets.app_root must be relative to the project root, got `{}`",
                self.assets.app_root.display()
            ))
            .into());
        }

        for pattern in &self.assets.source_files {
            if !pattern_within(pattern, &self.assets.app_root) {
                return Err(ConfigError::Validation(format!(
                    "assets.source_files pattern `{}` is outside assets.app_root `{}`; \
                     entry files must be servable",
                    pattern,
                    self.assets.app_root.display()
                ))
                .into());
            }
        }

        for pattern in &self.libraries.files {
            let covered = self
                .libraries
                .asset_roots
                .iter()
                .any(|root| pattern_within(pattern, Path::new(root)));
            if !covered {
                return Err(ConfigError::Validation(format!(
                    "libraries.files pattern `{}` is not under any libraries.asset_roots \
                     pattern; such files would never be servable",
                    pattern
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Validate configuration against the filesystem.
    fn validate(&self) -> Result<()> {
        if !self.assets.app_root.is_dir() {
            return Err(ConfigError::Validation(format!(
                "assets.app_root `{}` does not exist or is not a directory",
                self.assets.app_root.display()
            ))
            .into());
        }

        for path in &self.libraries.search_paths {
            if !path.is_dir() {
                log!(
                    "warning";
                    "library search path `{}` does not exist, skipping",
                    path.display()
                );
            }
        }

        if !self.precache.enabled() {
            return Ok(());
        }

        // Fail fast on a malformed compressor configuration; a missing
        // binary is only a warning since compression falls back.
        if self.precache.compress()
            && (self.precache.js_command.is_empty() || self.precache.css_command.is_empty())
        {
            return Err(ConfigError::Validation(
                "precache.mode = \"compress\" requires non-empty js_command and css_command"
                    .to_string(),
            )
            .into());
        }

        Ok(())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config from a TOML fragment.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
