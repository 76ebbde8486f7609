//! Directive scanning: the `//=` comment lines that drive resolution.
//!
//! Three forms are recognized, anchored per line:
//!
//! ```js
//! //= require <jquery>        // library by name, via the library table
//! //= require "helpers"       // path relative to this file, .js implied
//! //= provide "../images"     // expose for serving, outside dependency order
//! ```
//!
//! The scan is purely textual. A directive-shaped comment embedded in a
//! string literal is indistinguishable from a real directive; that is a
//! documented limitation of the format, not something to guess around.

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

/// Implied extension for extensionless relative requires.
pub const DEFAULT_EXT: &str = ".js";

static RE_REQUIRE_LIBRARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*//=\s+require\s+<(.*?)>\s*$"#).unwrap());
static RE_REQUIRE_RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*//=\s+require\s+"(.*?)"\s*$"#).unwrap());
static RE_PROVIDE_RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*//=\s+provide\s+"(.*?)"\s*$"#).unwrap());

/// A parsed directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `//= require <name>` — resolve through the library table.
    RequireLibrary(String),
    /// `//= require "path"` — resolve relative to the containing file.
    RequireRelative(String),
    /// `//= provide "path"` — expose a file or directory without ordering.
    ProvideRelative(String),
}

/// Scan file contents, yielding `(line_number, directive)` pairs lazily.
/// Line numbers are 1-based. Non-directive lines are not emitted.
pub fn scan(contents: &str) -> impl Iterator<Item = (usize, Directive)> + '_ {
    contents
        .lines()
        .enumerate()
        .filter_map(|(index, line)| parse_line(line).map(|d| (index + 1, d)))
}

fn parse_line(line: &str) -> Option<Directive> {
    if let Some(caps) = RE_REQUIRE_LIBRARY.captures(line) {
        return Some(Directive::RequireLibrary(caps[1].to_string()));
    }
    if let Some(caps) = RE_REQUIRE_RELATIVE.captures(line) {
        return Some(Directive::RequireRelative(caps[1].to_string()));
    }
    if let Some(caps) = RE_PROVIDE_RELATIVE.captures(line) {
        return Some(Directive::ProvideRelative(caps[1].to_string()));
    }
    None
}

/// Apply the implied `.js` extension to an extensionless relative require.
pub fn with_default_ext(reference: &str) -> String {
    if Path::new(reference).extension().is_some() {
        reference.to_string()
    } else {
        format!("{reference}{DEFAULT_EXT}")
    }
}
