//! Glob expansion of patterns against a list of base directories.
//!
//! Every base x pattern combination is expanded and the results unioned
//! (set semantics, not concatenation). Within one base, files walk in
//! sorted order and patterns apply in configured order, so
//! `["javascripts/app.js", "javascripts/*.js"]` reliably yields the entry
//! file first. That pattern-major ordering is what makes manifest order
//! deterministic.

use std::path::{Path, PathBuf};

use globset::{Glob, GlobMatcher};
use jwalk::WalkDir;
use rustc_hash::FxHashSet;

use crate::log;
use crate::utils::path::normalize_path;

/// Expand `patterns` under each of `bases`, returning canonical paths with
/// duplicates removed. Matches may be files or directories.
pub fn expand_paths(bases: &[PathBuf], patterns: &[String]) -> Vec<PathBuf> {
    let matchers = compile_patterns(patterns);

    let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
    let mut result = Vec::new();

    for base in bases {
        if !base.is_dir() {
            continue;
        }
        let entries = walk_sorted(base);

        for matcher in &matchers {
            for (relative, absolute) in &entries {
                if matcher.is_match(relative) {
                    let canonical = normalize_path(absolute);
                    if seen.insert(canonical.clone()) {
                        result.push(canonical);
                    }
                }
            }
        }
    }

    result
}

fn compile_patterns(patterns: &[String]) -> Vec<GlobMatcher> {
    patterns
        .iter()
        .filter_map(|pattern| match Glob::new(pattern) {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                log!("warning"; "invalid glob pattern '{}': {}", pattern, e);
                None
            }
        })
        .collect()
}

/// Walk a base directory, yielding (relative, absolute) pairs in sorted order.
fn walk_sorted(base: &Path) -> Vec<(PathBuf, PathBuf)> {
    WalkDir::new(base)
        .sort(true)
        .skip_hidden(false)
        .into_iter()
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let absolute = entry.path();
            let relative = absolute.strip_prefix(base).ok()?.to_path_buf();
            if relative.as_os_str().is_empty() {
                return None;
            }
            Some((relative, absolute))
        })
        .collect()
}
