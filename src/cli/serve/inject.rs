//! HTML tag injection.
//!
//! Served HTML pages get the manifest's script and link tags inserted
//! just before `</head>`, so application markup never hard-codes asset
//! references. Pages without a head close tag within the scan window
//! pass through unmodified.

/// How far into the document `</head>` is searched for. Real documents
/// close the head well within this.
const SCAN_WINDOW: usize = 8 * 1024;

/// Inject `tags` before the `</head>` tag, case-insensitively.
///
/// Returns the body unchanged when no `</head>` appears within the scan
/// window.
pub fn inject_tags(body: Vec<u8>, tags: &str) -> Vec<u8> {
    const PATTERN: &[u8] = b"</head>";

    let window = &body[..body.len().min(SCAN_WINDOW + PATTERN.len())];
    let Some(pos) = window
        .windows(PATTERN.len())
        .position(|w| w.eq_ignore_ascii_case(PATTERN))
    else {
        return body;
    };

    let tag_bytes = tags.as_bytes();
    let mut result = Vec::with_capacity(body.len() + tag_bytes.len());
    result.extend_from_slice(&body[..pos]);
    result.extend_from_slice(tag_bytes);
    result.extend_from_slice(&body[pos..]);
    result
}
