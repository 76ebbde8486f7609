//! `check` command: resolve everything once and report.

use anyhow::{Context, Result};

use crate::config::PipelineConfig;
use crate::log;

pub fn run(config: &PipelineConfig) -> Result<()> {
    let snapshot = config
        .resolver()
        .rebuild()
        .context("dependency resolution failed")?;

    log!(
        "resolve";
        "ok: {} manifest entr{}, {} provided file{}",
        snapshot.manifest.len(),
        if snapshot.manifest.len() == 1 { "y" } else { "ies" },
        snapshot.provided.len(),
        if snapshot.provided.len() == 1 { "" } else { "s" }
    );

    Ok(())
}
