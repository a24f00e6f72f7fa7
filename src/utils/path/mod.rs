//! Path and URL utilities.
//!
//! Pure functions for path manipulation. No side effects.
//!
//! - [`fs`]: Filesystem path resolution (`resolve_user_path`, `clean_path`)
//! - [`route`]: URL utilities (`is_external_link`, `to_url_path`, `from_url_path`)

pub mod fs;
pub mod route;

pub use fs::{clean_path, resolve_user_path};
pub use route::{from_url_path, is_external_link, to_url_path};
