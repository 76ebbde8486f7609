//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Normalize URL: strip query string, decode, trim slashes
///
/// The query is split off before decoding; an encoded `?` in a filename
/// stays part of the path.
pub fn clean_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;
    let path = url.split('?').next().unwrap_or(url);

    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();

    decoded.trim_matches('/').to_string()
}

/// Resolve a cleaned URL to a filesystem path under `serve_root`,
/// handling index.html for directories.
pub fn resolve_path(clean: &str, serve_root: &Path) -> Option<PathBuf> {
    // Reject paths with suspicious patterns early
    if clean.contains("..") {
        return None;
    }

    let local = serve_root.join(clean);

    // Canonicalize to resolve symlinks and verify path is under serve_root
    // This prevents traversal via symlinks or encoded sequences
    let canonical = local.canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;

    if !canonical.starts_with(&root_canonical) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }

    None
}
