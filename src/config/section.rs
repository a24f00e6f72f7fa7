//! Configuration sections.
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"
//! port = 8080
//! open_browser = true
//! open_delay_ms = 500
//! reload_debounce_ms = 50
//!
//! [watch]
//! debounce_ms = 300
//! recursive = false
//!
//! [cache]
//! capacity = 32
//!
//! [handoff]
//! namespace = "md-previewer-tmp"
//! ```

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use serde::Deserialize;

/// Preview server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind. Loopback only by default.
    pub interface: IpAddr,

    /// HTTP and WebSocket port. Fixed; a busy port is a startup error.
    pub port: u16,

    /// Open the default browser after binding.
    pub open_browser: bool,

    /// Delay before opening the browser.
    pub open_delay_ms: u64,

    /// Quiet period coalescing the artifact's own replace events.
    pub reload_debounce_ms: u64,
}

impl ServeConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.interface, self.port)
    }

    pub fn open_delay(&self) -> Duration {
        Duration::from_millis(self.open_delay_ms)
    }

    pub fn reload_debounce(&self) -> Duration {
        Duration::from_millis(self.reload_debounce_ms)
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 8080,
            open_browser: true,
            open_delay_ms: 500,
            reload_debounce_ms: 50,
        }
    }
}

/// Source watcher settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a rebuild.
    pub debounce_ms: u64,

    /// Also observe subdirectories of the source directory.
    pub recursive: bool,
}

impl WatchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: crate::watch::DEBOUNCE_MS,
            recursive: false,
        }
    }
}

/// Render cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of rendered documents kept. 0 means the default.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: crate::cache::DEFAULT_CAPACITY,
        }
    }
}

/// Handoff location settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HandoffConfig {
    /// Directory name under the system temp dir.
    pub namespace: String,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            namespace: crate::handoff::DEFAULT_NAMESPACE.to_string(),
        }
    }
}
