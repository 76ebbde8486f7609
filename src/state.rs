//! Process-wide serve state: shutdown flag and server registration.
//!
//! The Ctrl+C handler behavior depends on whether a server has been
//! registered:
//! - Before `register_server()`: sets the flag, process exits naturally
//! - After `register_server()`: graceful shutdown (unblock the accept loop)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::SeqCst)
}

/// Setup the global Ctrl+C handler. Call once at program start.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        match SERVER.get() {
            // Unblock incoming_requests() so the loop can observe the flag
            Some(server) => server.unblock(),
            None => std::process::exit(130),
        }
    })?;
    Ok(())
}

/// Register the HTTP server for graceful teardown.
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shutdown_flag_starts_clear() {
        assert!(!is_shutdown());
    }
}
