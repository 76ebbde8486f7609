//! Mtime-based freshness detection backing the staleness watermark.
//!
//! Asset identity is purely path + modification time: the watermark recorded
//! at rebuild time is the newest mtime across every tracked file, and a later
//! read is stale as soon as any tracked file is newer (or gone).

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

/// Maximum modification time across a set of paths.
///
/// Returns `None` if the set is empty or any path cannot be read; a vanished
/// tracked file must read as "changed", and `None` propagates that.
pub fn max_mtime<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Option<SystemTime> {
    let mut newest: Option<SystemTime> = None;
    let mut seen_any = false;

    for path in paths {
        seen_any = true;
        let mtime = get_mtime(path)?;
        newest = Some(match newest {
            Some(current) if current >= mtime => current,
            _ => mtime,
        });
    }

    if seen_any { newest } else { None }
}

/// Check if file A is newer than file B
///
/// Returns `false` if either file doesn't exist or times can't be compared
pub fn is_newer_than(a: &Path, b: &Path) -> bool {
    let (Some(a_time), Some(b_time)) = (get_mtime(a), get_mtime(b)) else {
        return false;
    };
    a_time > b_time
}
