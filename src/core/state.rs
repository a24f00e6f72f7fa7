//! Process-wide shutdown state.
//!
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C / SIGTERM received)
//! - `SERVER`: HTTP server to unblock (server process)
//! - `SHUTDOWN_TX`: wakes the watch loop (watcher process)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;
use tokio::sync::watch;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the watch loop
static SHUTDOWN_TX: OnceLock<watch::Sender<bool>> = OnceLock::new();

/// Setup the global Ctrl+C / SIGTERM handler. Call once at program start
///
/// The handler behavior depends on what has been registered:
/// - Nothing yet: exit immediately, there is nothing to tear down
/// - Otherwise: set the flag, wake the watch loop, unblock the server
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        request_shutdown();

        let registered = SHUTDOWN_TX.get().is_some() || SERVER.get().is_some();
        if !registered {
            std::process::exit(0);
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Flag shutdown and wake everything registered.
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::SeqCst);

    if let Some(tx) = SHUTDOWN_TX.get() {
        tx.send_replace(true);
    }

    if let Some(server) = SERVER.get() {
        crate::log!("serve"; "shutting down...");
        server.unblock();
    }
}

/// Register the HTTP server for graceful shutdown
///
/// Call this after binding the server, before entering the request loop
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Register the watch loop and get its shutdown receiver.
pub fn register_watcher() -> watch::Receiver<bool> {
    SHUTDOWN_TX
        .get_or_init(|| watch::channel(is_shutdown()).0)
        .subscribe()
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watcher_receiver_sees_shutdown() {
        let rx = register_watcher();

        request_shutdown();

        assert!(is_shutdown());
        assert!(*rx.borrow());
        assert!(*register_watcher().borrow());
    }
}
