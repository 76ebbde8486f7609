//! HTTP response handlers.

use super::inject::inject_tags;
use crate::config::PipelineConfig;
use crate::utils::{httpdate, mime};
use anyhow::{Context, Result};
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

/// Respond with a static file, optionally injecting head tags into HTML.
pub fn respond_file(request: Request, path: &Path, tags: Option<&str>) -> Result<()> {
    let content_type = mime::from_path(path);
    let last_modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map(httpdate::format)
        .ok();

    if is_head_request(&request) {
        return send_head(request, 200, content_type, last_modified);
    }

    let body = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let body = match (content_type.starts_with("text/html"), tags) {
        (true, Some(tags)) => inject_tags(body, tags),
        _ => body,
    };

    send_body(request, 200, content_type, last_modified, body)
}

/// Respond with 404 page (custom or default).
pub fn respond_not_found(request: Request, config: &PipelineConfig) -> Result<()> {
    use mime::types::{HTML, PLAIN};

    let custom_404 = config.assets.app_root.join("404.html");
    let has_custom = custom_404.is_file();

    if is_head_request(&request) {
        let content_type = if has_custom { HTML } else { PLAIN };
        return send_head(request, 404, content_type, None);
    }

    if has_custom
        && let Ok(body) = fs::read(&custom_404)
    {
        return send_body(request, 404, HTML, None, body);
    }

    send_body(request, 404, PLAIN, None, b"404 Not Found".to_vec())
}

/// Respond with 503 Service Unavailable (server shutting down).
pub fn respond_unavailable(request: Request) -> Result<()> {
    use mime::types::PLAIN;
    send_body(request, 503, PLAIN, None, b"503 Service Unavailable".to_vec())
}

/// Respond with 500 when no manifest could ever be built.
pub fn respond_resolution_error(request: Request) -> Result<()> {
    use mime::types::PLAIN;
    send_body(
        request,
        500,
        PLAIN,
        None,
        b"500 Internal Server Error: asset resolution failed, see server log".to_vec(),
    )
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(
    request: Request,
    status: u16,
    content_type: &'static str,
    last_modified: Option<String>,
) -> Result<()> {
    let mut response = Response::empty(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    if let Some(date) = last_modified {
        response = response.with_header(make_header("Last-Modified", &date));
    }
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    last_modified: Option<String>,
    body: Vec<u8>,
) -> Result<()> {
    let mut response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type));
    if let Some(date) = last_modified {
        response = response.with_header(make_header("Last-Modified", &date));
    }
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &str) -> Header {
    Header::from_bytes(key, value).unwrap()
}
