//! Source roots: the directories assets may be resolved under.
//!
//! Every servable file lives under exactly one root, and its URI is the
//! root-relative path with a leading slash. Roots are enumerated library
//! roots first (in configured order) with the application root last, so a
//! relative path present in both a library and the application resolves to
//! the library copy. That precedence is fixed and tested, not left to
//! filesystem enumeration order.

use std::path::{Path, PathBuf};

use crate::resolver::error::ResolveError;
use crate::utils::path::{forward_slashes, within_root};

/// Classification of a source root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// A discovered library package root.
    Library,
    /// The application's own public asset root.
    App,
}

/// An absolute directory assets resolve under.
#[derive(Debug, Clone)]
pub struct SourceRoot {
    pub path: PathBuf,
    pub kind: RootKind,
}

/// Ordered set of source roots.
#[derive(Debug, Clone, Default)]
pub struct RootSet {
    roots: Vec<SourceRoot>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a library root. Call before `push_app`.
    pub fn push_library(&mut self, path: PathBuf) {
        self.roots.push(SourceRoot {
            path,
            kind: RootKind::Library,
        });
    }

    /// Append the application root. Always enumerated last.
    pub fn push_app(&mut self, path: PathBuf) {
        self.roots.push(SourceRoot {
            path,
            kind: RootKind::App,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceRoot> {
        self.roots.iter()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Find the first root containing `path`.
    pub fn containing_root(&self, path: &Path) -> Option<&SourceRoot> {
        self.roots
            .iter()
            .find(|root| within_root(&root.path, path))
    }

    /// Map an absolute file path back to its public URI.
    ///
    /// The URI is `/` + the path relative to the first containing root,
    /// forward-slashed on every platform. Fails if no root contains the path,
    /// which is also what rejects directives that traverse out of their root.
    pub fn uri_for(&self, path: &Path) -> Result<String, ResolveError> {
        let root = self
            .containing_root(path)
            .ok_or_else(|| ResolveError::OutsideRoots {
                path: path.to_path_buf(),
            })?;

        let canonical = path.canonicalize().map_err(|e| ResolveError::io(path, e))?;
        let canonical_root = root
            .path
            .canonicalize()
            .map_err(|e| ResolveError::io(&root.path, e))?;
        // `containing_root` matched on canonical forms, so the strip can
        // only fail on a root that changed underneath us; that is an
        // unresolvable path, never an absolute-path "URI".
        let relative = canonical
            .strip_prefix(&canonical_root)
            .map_err(|_| ResolveError::OutsideRoots {
                path: path.to_path_buf(),
            })?;

        Ok(format!("/{}", forward_slashes(relative)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn root_with_file(name: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(name);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, "x").unwrap();
        (dir, file)
    }

    #[test]
    fn test_uri_for_leading_slash_and_separators() {
        let (dir, file) = root_with_file("javascripts/app.js");
        let mut roots = RootSet::new();
        roots.push_app(dir.path().to_path_buf());

        assert_eq!(roots.uri_for(&file).unwrap(), "/javascripts/app.js");
    }

    #[test]
    fn test_uri_for_outside_all_roots() {
        let (dir, _) = root_with_file("a.js");
        let (_other, stray) = root_with_file("b.js");

        let mut roots = RootSet::new();
        roots.push_app(dir.path().to_path_buf());

        assert!(matches!(
            roots.uri_for(&stray),
            Err(ResolveError::OutsideRoots { .. })
        ));
    }

    #[test]
    fn test_first_containing_root_wins() {
        let (lib, lib_file) = root_with_file("shared/util.js");
        let (app, _) = root_with_file("shared/util.js");

        let mut roots = RootSet::new();
        roots.push_library(lib.path().to_path_buf());
        roots.push_app(app.path().to_path_buf());

        let found = roots.containing_root(&lib_file).unwrap();
        assert_eq!(found.kind, RootKind::Library);
    }

    #[test]
    #[cfg(unix)]
    fn test_uri_for_through_symlinked_root() {
        let (real, _) = root_with_file("javascripts/app.js");
        let holder = tempfile::tempdir().unwrap();
        let link = holder.path().join("assets");
        std::os::unix::fs::symlink(real.path(), &link).unwrap();

        let mut roots = RootSet::new();
        roots.push_app(link.clone());

        // Resolution through the symlink must never yield an absolute
        // filesystem path as the URI
        let uri = roots.uri_for(&link.join("javascripts/app.js")).unwrap();
        assert_eq!(uri, "/javascripts/app.js");
    }

    #[test]
    fn test_traversal_escape_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("public");
        fs::create_dir(&inner).unwrap();
        let outside = dir.path().join("secret.js");
        fs::write(&outside, "x").unwrap();

        let mut roots = RootSet::new();
        roots.push_app(inner.clone());

        let escape = inner.join("..").join("secret.js");
        assert!(roots.uri_for(&escape).is_err());
    }
}
