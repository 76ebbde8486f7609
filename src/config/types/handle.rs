//! Global configuration handle.
//!
//! The configuration is loaded once at startup and then read from many
//! places (the request handlers, the tag renderer, the precache command).
//! It is stored behind an `ArcSwap` so readers take a cheap snapshot
//! without locking.

use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;

use crate::config::PipelineConfig;

static CONFIG: LazyLock<ArcSwap<PipelineConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(PipelineConfig::default()));

/// Returns the current configuration snapshot.
pub fn cfg() -> Arc<PipelineConfig> {
    CONFIG.load_full()
}

/// Installs the loaded configuration as the global one.
pub fn init_config(config: PipelineConfig) -> Arc<PipelineConfig> {
    let config = Arc::new(config);
    CONFIG.store(config.clone());
    config
}
