//! Preview server: HTTP for the page and images, WebSocket for reloads.
//!
//! ```text
//! GET /           → shell(index.html)
//! GET /images/*   → local file by absolute path
//! Upgrade: ws     → ConnectionSet (same port)
//! index.html replaced → ArtifactWatch → broadcast "reload"
//! ```
//!
//! The server never writes the handoff files; it only reads them.

mod artifact;
mod browser;
mod push;
mod response;

#[cfg(test)]
mod tests;

pub use artifact::ArtifactWatch;
pub use push::ConnectionSet;
pub use response::{image_path, render_index};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Request, Response, Server, StatusCode};
use tungstenite::WebSocket;
use tungstenite::handshake::derive_accept_key;
use tungstenite::protocol::Role;

use crate::builder::IMAGES_PREFIX;
use crate::cli::ServerCli;
use crate::config::{PreviewConfig, ServeConfig};
use crate::handoff::Handoff;
use crate::{debug, log};

/// Request handler threads.
const POOL_THREADS: usize = 4;

/// Bound server ready to accept requests
pub struct PreviewServer {
    server: Arc<Server>,
    addr: SocketAddr,
    handoff: Handoff,
    clients: ConnectionSet,
    config: ServeConfig,
}

/// Bind the HTTP listener on the configured (fixed) port.
pub fn bind(config: &ServeConfig, handoff: Handoff) -> Result<PreviewServer> {
    let requested = config.addr();
    let server = Server::http(requested)
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Failed to bind {requested}"))?;
    let addr = server.server_addr().to_ip().unwrap_or(requested);

    Ok(PreviewServer {
        server: Arc::new(server),
        addr,
        handoff,
        clients: ConnectionSet::new(),
        config: config.clone(),
    })
}

/// Run the server process until shutdown.
pub fn run(cli: &ServerCli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => PreviewConfig::from_path(path)?,
        None => PreviewConfig::default(),
    };
    let handoff = cli
        .handoff_dir
        .clone()
        .map(Handoff::new)
        .unwrap_or_else(|| config.handoff());

    let server = bind(&config.serve, handoff)?;
    crate::core::register_server(server.server());
    server.run(config.serve.open_browser && !cli.no_open)
}

impl PreviewServer {
    /// Get the bound address (the real port when configured with 0).
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn clients(&self) -> ConnectionSet {
        self.clients.clone()
    }

    /// Shared handle, for registering with the shutdown handler.
    pub fn server(&self) -> Arc<Server> {
        Arc::clone(&self.server)
    }

    /// Start the artifact watch, schedule the browser, and run the request
    /// loop until the server is unblocked.
    pub fn run(self, open_browser: bool) -> Result<()> {
        std::fs::create_dir_all(self.handoff.dir())
            .with_context(|| format!("Failed to create {}", self.handoff.dir().display()))?;
        let _artifact = ArtifactWatch::start(
            &self.handoff,
            self.clients.clone(),
            self.config.reload_debounce(),
        )
        .context("Failed to watch the preview artifact")?;

        log!("serve"; "{}", self.url());
        if open_browser {
            browser::open_after(self.url(), self.config.open_delay());
        }

        run_request_loop(&self.server, &self.handoff, &self.clients)
    }
}

fn run_request_loop(server: &Server, handoff: &Handoff, clients: &ConnectionSet) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(POOL_THREADS)
        .thread_name(|i| format!("serve-{i}"))
        .build()
        .context("Failed to create request pool")?;

    for request in server.incoming_requests() {
        let handoff = handoff.clone();
        let clients = clients.clone();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &handoff, &clients) {
                log!("serve"; "request error: {e}");
            }
        });
    }

    debug!("serve"; "request loop stopped");
    Ok(())
}

/// Handle a single HTTP request
fn handle_request(request: Request, handoff: &Handoff, clients: &ConnectionSet) -> Result<()> {
    if let Some(key) = websocket_key(&request) {
        return accept_websocket(request, &key, clients);
    }

    if !matches!(request.method(), tiny_http::Method::Get | tiny_http::Method::Head) {
        return response::respond_not_found(request);
    }

    let path = request.url().split(['?', '#']).next().unwrap_or("/").to_string();
    debug!("serve"; "{} {}", request.method(), path);

    if path == "/" {
        response::respond_index(request, handoff)
    } else if path.starts_with(IMAGES_PREFIX) {
        response::respond_image(request)
    } else {
        response::respond_not_found(request)
    }
}

/// `Sec-WebSocket-Key` of a WebSocket upgrade request, if this is one.
fn websocket_key(request: &Request) -> Option<String> {
    let header = |name: &str| {
        request
            .headers()
            .iter()
            .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str().to_string())
    };

    let upgrade = header("Upgrade")?;
    if !upgrade.eq_ignore_ascii_case("websocket") {
        return None;
    }
    header("Sec-WebSocket-Key")
}

/// Complete the handshake on the HTTP connection and hand the socket to
/// the connection set.
fn accept_websocket(request: Request, key: &str, clients: &ConnectionSet) -> Result<()> {
    let accept = derive_accept_key(key.trim().as_bytes());
    // tiny_http adds `Upgrade` and `Connection` itself.
    let response = Response::empty(StatusCode(101))
        .with_header(response::make_header("Sec-WebSocket-Accept", &accept)?);

    let stream = request.upgrade("websocket", response);
    let ws = WebSocket::from_raw_socket(stream, Role::Server, None);
    clients.attach(ws);
    Ok(())
}
