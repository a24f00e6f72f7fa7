use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::{Path, PathBuf};
use std::thread::JoinHandle;
use std::time::{Duration, Instant, SystemTime};

use tempfile::TempDir;
use tungstenite::stream::MaybeTlsStream;

use super::*;
use crate::builder::Builder;
use crate::embed::serve::RELOAD_MESSAGE;
use crate::watch::{EventFilter, FsWatch, SourceBuild, WatchTarget, Watcher};

// =============================================================================
// Helpers
// =============================================================================

struct Running {
    addr: SocketAddr,
    clients: ConnectionSet,
    server: Arc<Server>,
    handle: Option<JoinHandle<()>>,
}

impl Running {
    fn start(handoff: &Handoff) -> Self {
        let config = ServeConfig {
            port: 0,
            open_browser: false,
            ..ServeConfig::default()
        };
        let preview = bind(&config, handoff.clone()).unwrap();
        let addr = preview.addr();
        let clients = preview.clients();
        let server = preview.server();
        let handle = std::thread::spawn(move || preview.run(false).unwrap());
        Self {
            addr,
            clients,
            server,
            handle: Some(handle),
        }
    }

    fn get(&self, path: &str) -> (u16, String, Vec<u8>) {
        let mut stream = TcpStream::connect(self.addr).unwrap();
        write!(stream, "GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n").unwrap();
        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).unwrap();

        let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        let head = String::from_utf8_lossy(&raw[..split]).into_owned();
        let body = raw[split + 4..].to_vec();
        let status = head.split(' ').nth(1).unwrap().parse().unwrap();
        (status, head, body)
    }

    fn connect_ws(&self) -> tungstenite::WebSocket<MaybeTlsStream<TcpStream>> {
        let before = self.clients.len();
        let (ws, _) = tungstenite::connect(format!("ws://{}/", self.addr)).unwrap();
        wait_until(|| self.clients.len() > before);
        ws
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn wait_until(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "timed out");
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn set_read_timeout(ws: &tungstenite::WebSocket<MaybeTlsStream<TcpStream>>, timeout: Duration) {
    if let MaybeTlsStream::Plain(stream) = ws.get_ref() {
        stream.set_read_timeout(Some(timeout)).unwrap();
    }
}

fn read_text(ws: &mut tungstenite::WebSocket<MaybeTlsStream<TcpStream>>) -> Option<String> {
    match ws.read() {
        Ok(tungstenite::Message::Text(text)) => Some(text.as_str().to_string()),
        _ => None,
    }
}

fn setup() -> (TempDir, Handoff, PathBuf) {
    let temp = TempDir::new().unwrap();
    let handoff = Handoff::new(temp.path().join("handoff"));
    let docs = temp.path().join("docs");
    fs::create_dir_all(&docs).unwrap();
    (temp, handoff, docs)
}

// =============================================================================
// ConnectionSet
// =============================================================================

#[test]
fn test_broadcast_reaches_every_connection_once() {
    let clients = ConnectionSet::new();
    let receivers: Vec<_> = (0..3).map(|_| clients.subscribe()).collect();

    let delivered = clients.broadcast(RELOAD_MESSAGE);

    assert_eq!(delivered, 3);
    for rx in &receivers {
        assert_eq!(rx.try_recv(), Ok("reload"));
        assert!(rx.try_recv().is_err());
    }
}

#[test]
fn test_closed_connection_is_removed_without_affecting_others() {
    let clients = ConnectionSet::new();
    let a = clients.subscribe();
    let b = clients.subscribe();
    let c = clients.subscribe();
    drop(b);

    let delivered = clients.broadcast(RELOAD_MESSAGE);

    assert_eq!(delivered, 2);
    assert_eq!(clients.len(), 2);
    assert_eq!(a.try_recv(), Ok("reload"));
    assert_eq!(c.try_recv(), Ok("reload"));
}

#[test]
fn test_slow_connection_never_blocks_broadcast() {
    let clients = ConnectionSet::new();
    let slow = clients.subscribe();
    let fast = clients.subscribe();

    for _ in 0..100 {
        clients.broadcast(RELOAD_MESSAGE);
        let _ = fast.try_recv();
    }

    assert_eq!(clients.len(), 2);
    assert!(slow.try_iter().count() <= 4);
}

// =============================================================================
// HTTP
// =============================================================================

#[test]
fn test_get_root_wraps_artifact_in_shell() {
    let (_temp, handoff, docs) = setup();
    let file = docs.join("doc.md");
    fs::write(&file, "# Hi").unwrap();
    Builder::markdown(handoff.clone(), 4).build(&file).unwrap();
    let running = Running::start(&handoff);

    let (status, head, body) = running.get("/");

    let body = String::from_utf8(body).unwrap();
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("content-type: text/html"));
    assert!(body.starts_with("<!DOCTYPE html>"));
    assert!(body.contains("<h1 id=\"hi\">"));
    assert!(body.contains("new WebSocket"));
}

#[test]
fn test_get_root_without_artifact_is_404() {
    let (_temp, handoff, _docs) = setup();
    fs::create_dir_all(handoff.dir()).unwrap();
    let running = Running::start(&handoff);

    let (status, _, _) = running.get("/");

    assert_eq!(status, 404);
}

#[test]
fn test_artifact_is_only_served_at_root() {
    let (_temp, handoff, docs) = setup();
    let file = docs.join("doc.md");
    fs::write(&file, "# Hi").unwrap();
    Builder::markdown(handoff.clone(), 4).build(&file).unwrap();
    let running = Running::start(&handoff);

    assert_eq!(running.get("/").0, 200);
    assert_eq!(running.get("/index.html").0, 404);
    assert_eq!(running.get("/filePath.txt").0, 404);
}

#[test]
fn test_images_are_served_by_absolute_path() {
    let (_temp, handoff, docs) = setup();
    let image = docs.join("a b.png");
    fs::write(&image, [0x89, b'P', b'N', b'G']).unwrap();
    let running = Running::start(&handoff);

    let url = format!("/images{}", crate::utils::path::to_url_path(&image));
    let (status, head, body) = running.get(&url);

    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("content-type: image/png"));
    assert_eq!(body, vec![0x89, b'P', b'N', b'G']);
}

#[test]
fn test_missing_image_and_unknown_route_are_404() {
    let (_temp, handoff, docs) = setup();
    let running = Running::start(&handoff);

    let missing = format!("/images{}", crate::utils::path::to_url_path(&docs.join("nope.png")));
    assert_eq!(running.get(&missing).0, 404);
    assert_eq!(running.get("/elsewhere").0, 404);
    assert_eq!(running.get("/images/../etc/passwd").0, 404);
}

// =============================================================================
// Push channel
// =============================================================================

#[test]
fn test_artifact_change_reaches_all_websocket_clients() {
    let (_temp, handoff, _docs) = setup();
    handoff.write_artifact("<p>one</p>").unwrap();
    let running = Running::start(&handoff);

    let mut sockets: Vec<_> = (0..3).map(|_| running.connect_ws()).collect();
    handoff.write_artifact("<p>two</p>").unwrap();

    for ws in &mut sockets {
        set_read_timeout(ws, Duration::from_secs(5));
        assert_eq!(read_text(ws).as_deref(), Some("reload"));
    }
    for ws in &mut sockets {
        set_read_timeout(ws, Duration::from_millis(300));
        assert_eq!(read_text(ws), None);
    }
}

#[test]
fn test_touch_source_reloads_browser_once() {
    let (_temp, handoff, docs) = setup();
    let file = docs.join("doc.md");
    fs::write(&file, "# Hi").unwrap();
    let mut builder = Builder::markdown(handoff.clone(), 4);
    builder.build(&file).unwrap();

    let running = Running::start(&handoff);
    let (status, _, body) = running.get("/");
    assert_eq!(status, 200);
    assert!(String::from_utf8(body).unwrap().contains("<h1 id=\"hi\">"));

    let debounce = Duration::from_millis(100);
    let watcher = Watcher::new(SourceBuild::new(builder, &file), debounce);
    let target = WatchTarget::for_file(&file, false).unwrap();
    let _fs = FsWatch::start(&target, EventFilter::new(handoff.dir(), &file), watcher.notifier()).unwrap();
    let (stop, watch_thread) = spawn_watcher(watcher);

    let mut ws = running.connect_ws();
    touch(&file);

    set_read_timeout(&ws, Duration::from_secs(5));
    assert_eq!(read_text(&mut ws).as_deref(), Some("reload"));
    set_read_timeout(&ws, Duration::from_millis(500));
    assert_eq!(read_text(&mut ws), None);

    stop.send_replace(true);
    watch_thread.join().unwrap();
}

fn touch(path: &Path) {
    fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(SystemTime::now())
        .unwrap();
}

fn spawn_watcher<B: crate::watch::Rebuild>(
    watcher: Watcher<B>,
) -> (tokio::sync::watch::Sender<bool>, JoinHandle<()>) {
    let (tx, rx) = tokio::sync::watch::channel(false);
    let handle = std::thread::spawn(move || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(watcher.run(rx));
    });
    (tx, handle)
}
