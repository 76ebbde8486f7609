//! `manifest` command: print the resolved manifest in load order.

use anyhow::Result;

use crate::config::PipelineConfig;

pub fn run(config: &PipelineConfig) -> Result<()> {
    let snapshot = config.resolver().rebuild()?;

    for uri in &snapshot.manifest {
        println!("{}{}", config.assets.path_prefix, uri);
    }

    Ok(())
}
