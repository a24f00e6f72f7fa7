//! md-previewer - live markdown preview in the browser.
//!
//! Two processes cooperate through a small handoff directory:
//!
//! - `md-previewer` renders the file, writes `index.html`, and rebuilds on
//!   every change (`supervisor`, `watch`, `builder`).
//! - `md-previewer-server` serves that file inside a fixed page shell and
//!   tells connected browsers to reload when it is replaced (`serve`).

pub mod logger;

pub mod builder;
pub mod cache;
pub mod cli;
pub mod config;
pub mod core;
pub mod embed;
pub mod error;
pub mod handoff;
pub mod render;
pub mod serve;
pub mod supervisor;
pub mod utils;
pub mod watch;
