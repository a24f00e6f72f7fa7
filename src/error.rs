//! Error taxonomy shared by the watcher and server processes.
//!
//! Startup paths treat every variant as fatal. Steady-state paths (the watch
//! loop, request handlers) log and recover; see `Watcher` and `serve`.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::render::RenderError;

#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Invalid arguments: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Render failed")]
    Render(#[from] RenderError),

    #[error("IO error on `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Not found: {}", .0.display())]
    ServeNotFound(PathBuf),

    #[error("Failed to serve `{}`", path.display())]
    ServeIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Server process exited unexpectedly ({0})")]
    ChildProcessExit(ExitStatus),

    #[error("Cannot launch preview server: {0}")]
    ServerLaunch(String),
}

impl PreviewError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map a read error while serving into the 404/500 split.
    pub fn serve(path: impl Into<PathBuf>, source: io::Error) -> Self {
        let path = path.into();
        if source.kind() == io::ErrorKind::NotFound {
            Self::ServeNotFound(path)
        } else {
            Self::ServeIo { path, source }
        }
    }

    /// HTTP status for errors surfaced by the server.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ServeNotFound(_) | Self::SourceNotFound(_) => 404,
            _ => 500,
        }
    }
}

pub type Result<T, E = PreviewError> = std::result::Result<T, E>;
