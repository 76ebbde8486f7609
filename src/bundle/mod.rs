//! Bundling: concatenate resolved assets into per-type artifacts.

mod artifact;
mod compress;
pub mod css;

pub use artifact::{Compressor, is_artifact_fresh, write_bundle};
pub use compress::compress;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use crate::log;
use crate::resolver::Snapshot;

/// Asset type a bundle is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetType {
    Script,
    Style,
}

impl AssetType {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Script => "js",
            Self::Style => "css",
        }
    }

    /// Artifact filename under the app asset root.
    pub fn bundle_name(self) -> &'static str {
        match self {
            Self::Script => "bundle.js",
            Self::Style => "bundle.css",
        }
    }

    /// Artifact URI as served.
    pub fn bundle_uri(self) -> &'static str {
        match self {
            Self::Script => "/bundle.js",
            Self::Style => "/bundle.css",
        }
    }

    pub fn matches_uri(self, uri: &str) -> bool {
        Path::new(uri)
            .extension()
            .is_some_and(|ext| ext == self.extension())
    }

    /// Source-attribution comment preceding each file in the bundle.
    fn attribution(self, path: &Path) -> String {
        match self {
            Self::Script => format!("\n// {}\n", path.display()),
            Self::Style => format!("\n/* {} */\n", path.display()),
        }
    }
}

/// Concatenate the manifest's files of one type, in manifest order, each
/// prefixed with a source-attribution comment. `rewrite` transforms each
/// file's content before concatenation (identity for scripts, URL rebasing
/// for stylesheets).
pub fn bundle_with<F>(snapshot: &Snapshot, kind: AssetType, mut rewrite: F) -> Result<String>
where
    F: FnMut(&str, &str) -> String,
{
    let mut out = String::new();

    for uri in snapshot.manifest.iter().filter(|u| kind.matches_uri(u)) {
        let path = snapshot
            .path_for(uri)
            .ok_or_else(|| anyhow!("manifest URI {uri} missing from provided table"))?;
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        out.push_str(&kind.attribution(path));
        out.push_str(&rewrite(&content, uri));
    }

    Ok(out)
}

/// Bundle with the default rewrite for the asset type: stylesheets get
/// their `url(...)` references rebased onto the bundle location.
pub fn bundle(snapshot: &Snapshot, kind: AssetType) -> Result<String> {
    match kind {
        AssetType::Script => bundle_with(snapshot, kind, |content, _| content.to_string()),
        AssetType::Style => bundle_with(snapshot, kind, |content, uri| {
            let (rewritten, count) = css::rewrite_urls(content, uri, kind.bundle_uri());
            if count > 0 {
                log!("bundle"; "rewrote {} url reference(s) in {}", count, uri);
            }
            rewritten
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashMap;
    use std::path::PathBuf;

    fn snapshot_with(files: &[(&str, &str)], dir: &tempfile::TempDir) -> Snapshot {
        let mut manifest = Vec::new();
        let mut provided = FxHashMap::default();
        for (uri, contents) in files {
            let path = dir.path().join(uri.trim_start_matches('/'));
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, contents).unwrap();
            manifest.push((*uri).to_string());
            provided.insert((*uri).to_string(), path);
        }
        Snapshot {
            manifest,
            provided,
            watermark: None,
            source_files: Vec::new(),
        }
    }

    #[test]
    fn test_bundle_concatenates_in_manifest_order() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_with(&[("/a.js", "var a;\n"), ("/b.js", "var b;\n")], &dir);

        let out = bundle(&snapshot, AssetType::Script).unwrap();
        let a = out.find("var a;").unwrap();
        let b = out.find("var b;").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_bundle_attribution_comments() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_with(&[("/a.js", "var a;\n")], &dir);

        let out = bundle(&snapshot, AssetType::Script).unwrap();
        assert!(out.contains("// "));
        assert!(out.contains("a.js"));
    }

    #[test]
    fn test_bundle_filters_by_type() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot =
            snapshot_with(&[("/a.js", "var a;\n"), ("/site.css", "body{}\n")], &dir);

        let scripts = bundle(&snapshot, AssetType::Script).unwrap();
        assert!(scripts.contains("var a;"));
        assert!(!scripts.contains("body{}"));

        let styles = bundle(&snapshot, AssetType::Style).unwrap();
        assert!(styles.contains("body{}"));
        assert!(!styles.contains("var a;"));
    }

    #[test]
    fn test_bundle_rewrites_stylesheet_urls() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = snapshot_with(
            &[("/css/site.css", "body { background: url(images/bg.png); }\n")],
            &dir,
        );

        let out = bundle(&snapshot, AssetType::Style).unwrap();
        assert!(out.contains("url(css/images/bg.png)"));
    }
}
