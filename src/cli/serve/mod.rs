//! Development server: resolves on demand and serves the provided assets.

mod lifecycle;
mod path;
mod response;

pub mod inject;
pub mod tags;

use crate::{
    config::{PipelineConfig, cfg},
    log,
    resolver::{Engine, Snapshot},
    state,
};
use anyhow::Result;
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Bind the server and run the request loop until shutdown.
pub fn run(config: &Arc<PipelineConfig>) -> Result<()> {
    let engine = Arc::new(Engine::new(config.resolver()));

    // Resolve eagerly so configuration problems surface at startup. In
    // live mode failures are not fatal: requests retry and serve whatever
    // snapshot exists. Precache mode writes its artifacts now and serves
    // statics from then on, so it cannot start without a manifest.
    match engine.refresh() {
        Ok(snapshot) => {
            log!("resolve"; "{} assets in manifest", snapshot.manifest.len());
            if config.precache.enabled() {
                super::precache::materialize(&snapshot, config)?;
            }
        }
        Err(e) if config.precache.enabled() => return Err(e.into()),
        Err(e) => log!("error"; "initial resolution failed: {e}"),
    }

    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    state::register_server(Arc::clone(&server));

    log!("serve"; "http://{}", addr);

    run_request_loop(&server, engine);
    Ok(())
}

fn run_request_loop(server: &Server, engine: Arc<Engine>) {
    // Use thread pool to handle requests concurrently
    // This prevents a slow rebuild from blocking other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .expect("failed to create thread pool");

    for request in server.incoming_requests() {
        let engine = Arc::clone(&engine);
        let config = cfg();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &engine, &config) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, engine: &Engine, config: &PipelineConfig) -> Result<()> {
    // Early exit if shutdown requested
    if state::is_shutdown() {
        return response::respond_unavailable(request);
    }

    let snapshot = current_snapshot(engine, config);

    let clean = path::clean_url(strip_prefix(request.url(), &config.assets.path_prefix));

    // Resolved assets are looked up by URI first; they may live outside
    // the app root (library files served in place).
    if let Some(snapshot) = &snapshot {
        let uri = format!("/{clean}");
        if let Some(asset) = snapshot.path_for(&uri) {
            let asset = asset.to_path_buf();
            return response::respond_file(request, &asset, None);
        }
    }

    // Everything else falls through to the app root. HTML pages get the
    // manifest's tags injected on the way out.
    if let Some(file) = path::resolve_path(&clean, &config.assets.app_root) {
        let tags = snapshot.as_ref().map(|s| tags::html_tags(s, config));
        return response::respond_file(request, &file, tags.as_deref());
    }

    if snapshot.is_none() {
        return response::respond_resolution_error(request);
    }

    response::respond_not_found(request, config)
}

/// Snapshot backing one request.
///
/// Live mode re-resolves when anything tracked changed, keeping the last
/// good snapshot on failure. Precache mode serves the startup snapshot
/// without per-request resolution; the artifacts on disk are the product
/// of that snapshot and a rebuild would desynchronize the tags from them.
fn current_snapshot(engine: &Engine, config: &PipelineConfig) -> Option<Arc<Snapshot>> {
    if config.precache.enabled() {
        return engine.current();
    }

    match engine.refresh() {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            log!("error"; "{e}");
            engine.current()
        }
    }
}

/// Strip the configured URI prefix from an incoming URL.
fn strip_prefix<'a>(url: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return url;
    }
    url.strip_prefix(prefix).unwrap_or(url)
}
