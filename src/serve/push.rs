//! Push channel: the set of live WebSocket clients.
//!
//! ```text
//! broadcast ─try_send─▶ [queue(4)] ─▶ writer thread ─▶ socket
//!           ─try_send─▶ [queue(4)] ─▶ writer thread ─▶ socket
//! ```
//!
//! Broadcast never touches a socket. A full queue means a reload is already
//! pending for that client, so the message is dropped. A closed queue means
//! the writer thread exited (socket error), so the entry is removed.

use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

/// Per-connection queue bound.
const QUEUE_CAPACITY: usize = 4;

struct Connection {
    id: u64,
    tx: Sender<&'static str>,
}

/// Live push connections. Cheap to clone; clones share the set.
#[derive(Clone, Default)]
pub struct ConnectionSet {
    connections: Arc<Mutex<Vec<Connection>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a raw message queue and return its receiving end.
    ///
    /// The entry is dropped from the set on the first broadcast after the
    /// receiver goes away.
    pub fn subscribe(&self) -> Receiver<&'static str> {
        let (tx, rx) = channel::bounded(QUEUE_CAPACITY);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut connections = self.connections.lock();
        connections.push(Connection { id, tx });
        crate::debug!("ws"; "client {} connected (total: {})", id, connections.len());
        rx
    }

    /// Take ownership of an accepted WebSocket and serve it from a
    /// dedicated writer thread.
    pub fn attach<S>(&self, mut ws: WebSocket<S>)
    where
        S: Read + Write + Send + 'static,
    {
        let rx = self.subscribe();
        std::thread::spawn(move || {
            for payload in rx {
                if let Err(e) = ws.send(Message::text(payload)) {
                    crate::debug!("ws"; "client dropped: {}", e);
                    break;
                }
            }
            let _ = ws.close(None);
        });
    }

    /// Queue `payload` for every live connection. Returns how many accepted it.
    pub fn broadcast(&self, payload: &'static str) -> usize {
        let mut delivered = 0;
        let mut connections = self.connections.lock();
        connections.retain(|conn| match conn.tx.try_send(payload) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => true,
            Err(TrySendError::Disconnected(_)) => {
                crate::debug!("ws"; "client {} disconnected", conn.id);
                false
            }
        });
        crate::debug!("ws"; "broadcast {:?} to {}/{} clients", payload, delivered, connections.len());
        delivered
    }

    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
