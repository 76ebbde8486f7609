//! Stylesheet URL rewriting.
//!
//! When stylesheets are concatenated into a bundle their relative
//! `url(...)` references would resolve against the bundle's location
//! instead of the original file's. Each reference is rebased: joined with
//! the source file's directory, dot-segments folded, then made relative to
//! the bundle's directory. Absolute paths, full URLs, data URIs and
//! fragment references are left alone.

use regex::Regex;
use std::sync::LazyLock;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"url\(([^)]*)\)").unwrap());

/// Rewrite every relative `url(...)` in `content` so it stays valid when
/// served from `bundle_uri` instead of `source_uri`. Returns the rewritten
/// content and the number of references rewritten.
pub fn rewrite_urls(content: &str, source_uri: &str, bundle_uri: &str) -> (String, usize) {
    let source_dir = parent_of(source_uri);
    let bundle_dir = parent_of(bundle_uri);
    let mut count = 0;

    let rewritten = URL_RE.replace_all(content, |caps: &regex::Captures| {
        let (quote, reference) = unquote(caps[1].trim());

        if !needs_rewrite(reference) {
            return caps[0].to_string();
        }

        count += 1;
        let target = resolve_segments(source_dir, reference);
        let rebased = relative_from(bundle_dir, &target);
        format!("url({quote}{rebased}{quote})")
    });

    (rewritten.into_owned(), count)
}

/// Split a url() argument into its quote character (if any) and the bare
/// reference.
fn unquote(raw: &str) -> (&str, &str) {
    for quote in ["\"", "'"] {
        if let Some(inner) = raw
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return (quote, inner.trim());
        }
    }
    ("", raw)
}

/// Only relative path references get rebased.
fn needs_rewrite(reference: &str) -> bool {
    !(reference.is_empty()
        || reference.starts_with('/')
        || reference.starts_with('#')
        || reference.starts_with("data:")
        || reference.contains("://"))
}

/// Directory part of a URI (without trailing slash).
fn parent_of(uri: &str) -> &str {
    uri.rsplit_once('/').map_or("", |(dir, _)| dir)
}

/// Join `reference` onto `dir` and fold `.`/`..` segments.
fn resolve_segments(dir: &str, reference: &str) -> Vec<String> {
    let mut segments: Vec<String> = dir
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .map(String::from)
        .collect();

    for segment in reference.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s.to_string()),
        }
    }
    segments
}

/// Path from `from_dir` to `target`, as a relative URI.
fn relative_from(from_dir: &str, target: &[String]) -> String {
    let from: Vec<&str> = from_dir.split('/').filter(|s| !s.is_empty()).collect();

    let common = from
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| **a == b.as_str())
        .count();

    let mut parts: Vec<&str> = Vec::new();
    for _ in common..from.len() {
        parts.push("..");
    }
    for segment in &target[common..] {
        parts.push(segment);
    }
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_relative_to_bundle_root() {
        // the canonical example: css/site.css bundled into /bundle.css
        let (out, count) = rewrite_urls(
            "body { background: url(images/bg.png); }",
            "/css/site.css",
            "/bundle.css",
        );
        assert_eq!(out, "body { background: url(css/images/bg.png); }");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_rewrite_preserves_quotes() {
        let (out, _) = rewrite_urls(
            r#"@font-face { src: url("fonts/a.woff2"); }"#,
            "/css/site.css",
            "/bundle.css",
        );
        assert!(out.contains(r#"url("css/fonts/a.woff2")"#));
    }

    #[test]
    fn test_rewrite_folds_dot_segments() {
        let (out, _) = rewrite_urls(
            "a { background: url(../images/bg.png); }",
            "/css/nested/deep.css",
            "/bundle.css",
        );
        assert!(out.contains("url(css/images/bg.png)"));
    }

    #[test]
    fn test_rewrite_into_nested_bundle_dir() {
        let (out, _) = rewrite_urls(
            "a { background: url(bg.png); }",
            "/css/site.css",
            "/out/bundle.css",
        );
        assert!(out.contains("url(../css/bg.png)"));
    }

    #[test]
    fn test_absolute_and_external_left_alone() {
        let css = "a { background: url(/images/bg.png) url(https://cdn.example.com/x.png) \
                   url(data:image/png;base64,AAAA) url(#gradient); }";
        let (out, count) = rewrite_urls(css, "/css/site.css", "/bundle.css");
        assert_eq!(out, css);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_multiple_rewrites_counted() {
        let (_, count) = rewrite_urls(
            "a { background: url(a.png); } b { background: url(b.png); }",
            "/css/site.css",
            "/bundle.css",
        );
        assert_eq!(count, 2);
    }
}
