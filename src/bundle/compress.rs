//! External minifier invocation with graceful fallback.
//!
//! Compression is strictly best-effort: a missing binary, a crash, a
//! timeout or empty output all degrade to the uncompressed bundle with a
//! warning. An end user must never see a broken page because the minifier
//! was unavailable.

use std::time::Duration;

use crate::log;
use crate::utils::exec::Cmd;

/// Pipe `source` through the configured minifier command.
///
/// Returns `None` on any failure; the caller serves the original text.
pub fn compress(source: &str, command: &[String], timeout: Duration) -> Option<String> {
    let program = match command.first() {
        Some(program) if !program.is_empty() => program,
        _ => {
            log!("warning"; "no compressor command configured, skipping compression");
            return None;
        }
    };

    if which::which(program).is_err() {
        log!("warning"; "compressor `{}` not found in PATH, using uncompressed output", program);
        return None;
    }

    let output = match Cmd::from_slice(command)
        .stdin(source)
        .timeout(timeout)
        .run()
    {
        Ok(output) => output,
        Err(e) => {
            log!("warning"; "could not compress: {e:#} (using `{}`)", command.join(" "));
            return None;
        }
    };

    let text = match String::from_utf8(output.stdout) {
        Ok(text) => text,
        Err(_) => {
            log!("warning"; "compressor `{}` produced non-UTF-8 output", program);
            return None;
        }
    };

    if text.trim().is_empty() {
        log!("warning"; "compressor `{}` produced empty output", program);
        return None;
    }

    let saved = 100.0 * (1.0 - text.len() as f64 / source.len().max(1) as f64);
    log!(
        "compress";
        "{}k to {}k ({saved:.0}% smaller)",
        source.len() / 1024,
        text.len() / 1024
    );

    Some(text)
}
