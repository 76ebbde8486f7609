//! Resolution error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building the dependency manifest.
///
/// Every variant is fatal to the rebuild in progress: an unresolvable
/// directive is a configuration problem the operator has to see, never
/// something to skip past. The previous good snapshot stays in effect.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A directive references something that cannot be resolved to a
    /// readable file. Carries the offending source file and line number.
    #[error("could not resolve '{reference}' ({}, line {line})", file.display())]
    UnknownAsset {
        reference: String,
        file: PathBuf,
        line: usize,
    },

    /// A resolved path does not lie under any configured asset root.
    #[error("{} is not under any configured asset root", path.display())]
    OutsideRoots { path: PathBuf },

    /// A tracked file could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
