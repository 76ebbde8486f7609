//! Library table: named script files discovered under library roots.
//!
//! A library's name is its base filename with the extension stripped, so
//! `vendor/jquery/assets/javascripts/jquery.js` registers as `jquery` and
//! resolves `//= require <jquery>`.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use crate::log;

/// Name → path table for `require <name>` resolution.
#[derive(Debug, Clone, Default)]
pub struct LibraryTable {
    entries: FxHashMap<String, PathBuf>,
}

impl LibraryTable {
    /// Build the table from discovered library files.
    ///
    /// Names must be unique per resolution pass; a duplicate logs a warning
    /// and the first-seen path wins.
    pub fn from_paths(paths: &[PathBuf]) -> Self {
        let mut entries: FxHashMap<String, PathBuf> = FxHashMap::default();

        for path in paths {
            let Some(name) = library_name(path) else {
                continue;
            };
            if let Some(existing) = entries.get(&name) {
                log!(
                    "warning";
                    "multiple libraries for <{}>, using {}", name, existing.display()
                );
                continue;
            }
            entries.insert(name, path.clone());
        }

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.entries.get(name).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Extract a library name from a path: base filename, extension stripped.
fn library_name(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}
