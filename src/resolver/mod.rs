//! Dependency resolution: roots, directives, libraries and the manifest
//! engine.

mod directive;
mod engine;
mod error;
mod expand;
mod library;
mod roots;

pub use directive::{DEFAULT_EXT, Directive, scan, with_default_ext};
pub use engine::{Engine, Resolver, Snapshot};
pub use error::ResolveError;
pub use expand::expand_paths;
pub use library::LibraryTable;
pub use roots::{RootKind, RootSet, SourceRoot};
