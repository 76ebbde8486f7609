//! Bundle artifact lifecycle: staleness-gated writes.
//!
//! Multiple server processes may start concurrently and race to produce
//! the same artifact. The discipline is first-writer-wins: a bundle is
//! (re)written only when the on-disk copy is absent, empty, or older than
//! the newest tracked source; later writers observe a fresh artifact and
//! skip. Redundant writes during the race are harmless — the artifact is
//! always rewritten as a whole, never patched.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use crate::bundle::{AssetType, bundle, compress};
use crate::resolver::Snapshot;
use crate::{debug, log};

/// Compressor selection for `write_bundle`.
pub struct Compressor<'a> {
    pub command: &'a [String],
    pub timeout: Duration,
}

/// True when the on-disk artifact exists, is non-empty, and no tracked
/// source file is newer than it.
pub fn is_artifact_fresh(path: &Path, snapshot: &Snapshot) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    if metadata.len() == 0 {
        return false;
    }
    match metadata.modified() {
        Ok(mtime) => !snapshot.newer_than(mtime),
        Err(_) => false,
    }
}

/// Write the bundle artifact for one asset type under `app_root`.
///
/// Returns the artifact path when a write happened, `None` when the
/// existing artifact was already fresh. Compression failures degrade to
/// the uncompressed bundle.
pub fn write_bundle(
    snapshot: &Snapshot,
    kind: AssetType,
    app_root: &Path,
    compressor: Option<&Compressor<'_>>,
) -> Result<Option<PathBuf>> {
    let target = app_root.join(kind.bundle_name());

    if is_artifact_fresh(&target, snapshot) {
        debug!("bundle"; "{} is fresh, skipping", target.display());
        return Ok(None);
    }

    let mut content = bundle(snapshot, kind)?;
    if content.is_empty() {
        debug!("bundle"; "no {} assets, skipping {}", kind.extension(), kind.bundle_name());
        return Ok(None);
    }

    if let Some(compressor) = compressor {
        match compress(&content, compressor.command, compressor.timeout) {
            Some(compressed) => content = compressed,
            None => log!("warning"; "reverting to uncompressed {}", kind.bundle_name()),
        }
    }

    fs::write(&target, &content)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    log!("bundle"; "wrote {} ({} bytes)", target.display(), content.len());

    Ok(Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;
    use std::time::SystemTime;

    fn snapshot_one_script(dir: &Path) -> Snapshot {
        let source = dir.join("app.js");
        fs::write(&source, "var app = 1;\n").unwrap();

        let mut provided = FxHashMap::default();
        provided.insert("/app.js".to_string(), source.clone());
        Snapshot {
            manifest: vec!["/app.js".to_string()],
            provided,
            watermark: crate::freshness::get_mtime(&source),
            source_files: vec![source],
        }
    }

    #[test]
    fn test_write_then_skip_when_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_one_script(dir.path());

        let written = write_bundle(&snapshot, AssetType::Script, dir.path(), None).unwrap();
        assert!(written.is_some());

        // second writer in the race observes a fresh artifact
        let skipped = write_bundle(&snapshot, AssetType::Script, dir.path(), None).unwrap();
        assert!(skipped.is_none());
    }

    #[test]
    fn test_rewrite_when_source_newer() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_one_script(dir.path());

        write_bundle(&snapshot, AssetType::Script, dir.path(), None).unwrap();

        let future = SystemTime::now() + Duration::from_secs(60);
        let source = &snapshot.source_files[0];
        fs::File::open(source).unwrap().set_modified(future).unwrap();

        let rewritten = write_bundle(&snapshot, AssetType::Script, dir.path(), None).unwrap();
        assert!(rewritten.is_some());
    }

    #[test]
    fn test_no_matching_assets_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_one_script(dir.path());

        // script-only manifest: no stylesheet bundle appears
        let written = write_bundle(&snapshot, AssetType::Style, dir.path(), None).unwrap();
        assert!(written.is_none());
        assert!(!dir.path().join(AssetType::Style.bundle_name()).exists());
    }

    #[test]
    fn test_empty_artifact_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_one_script(dir.path());

        let target = dir.path().join(AssetType::Script.bundle_name());
        fs::write(&target, "").unwrap();
        assert!(!is_artifact_fresh(&target, &snapshot));
    }

    #[test]
    fn test_failed_compressor_still_writes_uncompressed() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_one_script(dir.path());

        let command = vec!["no-such-minifier-9d4e".to_string()];
        let compressor = Compressor {
            command: &command,
            timeout: Duration::from_secs(1),
        };

        let written =
            write_bundle(&snapshot, AssetType::Script, dir.path(), Some(&compressor)).unwrap();
        let content = fs::read_to_string(written.unwrap()).unwrap();
        assert!(content.contains("var app = 1;"));
    }
}
