//! Core process state shared by both binaries.

mod state;

pub use state::{
    is_shutdown, register_server, register_watcher, request_shutdown, setup_shutdown_handler,
};
