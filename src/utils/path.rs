//! Path normalization utilities.
//!
//! Provides consistent path handling across the codebase:
//! - `normalize_path` - file system paths (canonicalize + fallback)
//! - `within_root` - canonical strict-prefix containment check
//! - `forward_slashes` - platform-independent URI segments

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Check whether `path` lies strictly inside `root`.
///
/// Both sides are canonicalized before comparison, so `..` segments and
/// symlinks cannot smuggle a path outside its root. The root itself does
/// not count as being within the root.
pub fn within_root(root: &Path, path: &Path) -> bool {
    let (Ok(root), Ok(path)) = (root.canonicalize(), path.canonicalize()) else {
        return false;
    };
    path.starts_with(&root) && path != root
}

/// Render a relative path with forward-slash separators regardless of
/// platform. Used when turning filesystem paths into URIs.
pub fn forward_slashes(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_normalize_path_relative() {
        let path = Path::new("relative/path/file.txt");
        let normalized = normalize_path(path);
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_within_root_accepts_child() {
        let dir = tempfile::tempdir().unwrap();
        let child = dir.path().join("a.js");
        fs::write(&child, "x").unwrap();
        assert!(within_root(dir.path(), &child));
    }

    #[test]
    fn test_within_root_rejects_root_itself() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!within_root(dir.path(), dir.path()));
    }

    #[test]
    fn test_within_root_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("inner");
        fs::create_dir(&inner).unwrap();
        let sibling = dir.path().join("secret.txt");
        fs::write(&sibling, "x").unwrap();

        // inner/../secret.txt canonicalizes outside inner
        let escape = inner.join("..").join("secret.txt");
        assert!(!within_root(&inner, &escape));
    }

    #[test]
    fn test_forward_slashes() {
        let path = Path::new("javascripts").join("vendor").join("jquery.js");
        assert_eq!(forward_slashes(&path), "javascripts/vendor/jquery.js");
    }
}
