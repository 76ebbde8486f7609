//! `precache` command: write bundles and mirror library assets.
//!
//! After precaching, the app root is self-contained: any plain web
//! server can serve the application without the resolver running. Files
//! provided from library roots are copied under the app root at their
//! URIs, and concatenated bundles are written for scripts and styles.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::bundle::{AssetType, Compressor, write_bundle};
use crate::config::PipelineConfig;
use crate::freshness;
use crate::resolver::Snapshot;
use crate::{debug, log};

pub fn run(config: &PipelineConfig) -> Result<()> {
    let snapshot = config.resolver().rebuild()?;
    materialize(&snapshot, config)
}

/// Write bundle artifacts and mirror provided files under the app root.
///
/// Doubles as the startup step of precache-mode serving: once this has
/// run, requests are answered from disk without per-request resolution.
pub fn materialize(snapshot: &Snapshot, config: &PipelineConfig) -> Result<()> {
    let mirrored = mirror_provided(snapshot, &config.assets.app_root)?;
    if mirrored > 0 {
        log!("bundle"; "mirrored {} library asset{} into {}",
            mirrored, if mirrored == 1 { "" } else { "s" },
            config.assets.app_root.display());
    }

    let compressor = config.precache.compress().then(|| CompressorPair {
        js: Compressor {
            command: config.precache.command_for(AssetType::Script),
            timeout: config.precache.timeout(),
        },
        css: Compressor {
            command: config.precache.command_for(AssetType::Style),
            timeout: config.precache.timeout(),
        },
    });

    let (js, css) = rayon::join(
        || {
            write_bundle(
                snapshot,
                AssetType::Script,
                &config.assets.app_root,
                compressor.as_ref().map(|c| &c.js),
            )
        },
        || {
            write_bundle(
                snapshot,
                AssetType::Style,
                &config.assets.app_root,
                compressor.as_ref().map(|c| &c.css),
            )
        },
    );
    js?;
    css?;

    Ok(())
}

struct CompressorPair<'a> {
    js: Compressor<'a>,
    css: Compressor<'a>,
}

/// Copy provided files that live outside the app root to their URI
/// locations under it. Returns the number of files copied.
///
/// Manifest entries are skipped: those are served from the bundle
/// artifacts. Copies are staleness-gated like bundles, so an up-to-date
/// mirror is left alone and concurrent precache runs converge without
/// rework.
fn mirror_provided(snapshot: &Snapshot, app_root: &Path) -> Result<usize> {
    let bundled: rustc_hash::FxHashSet<&str> =
        snapshot.manifest.iter().map(String::as_str).collect();
    let mut copied = 0;

    for (uri, source) in &snapshot.provided {
        if source.starts_with(app_root) || bundled.contains(uri.as_str()) {
            continue;
        }

        let dest = app_root.join(uri.trim_start_matches('/'));
        if mirror_is_fresh(source, &dest) {
            debug!("bundle"; "{} is fresh, skipping", dest.display());
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(source, &dest).with_context(|| {
            format!("Failed to copy {} to {}", source.display(), dest.display())
        })?;
        copied += 1;
    }

    Ok(copied)
}

fn mirror_is_fresh(source: &Path, dest: &Path) -> bool {
    match (freshness::get_mtime(source), freshness::get_mtime(dest)) {
        (Some(src), Some(dst)) => dst >= src,
        _ => false,
    }
}
