//! Locating the preview server executable.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{PreviewError, Result};

/// Base name of the server binary.
pub const SERVER_BIN: &str = "md-previewer-server";

/// Where the server came from, in selection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchKind {
    /// `md-previewer-server-<os>-<arch>[.exe]`
    Platform,
    /// `md-previewer-server[.exe]`
    Generic,
    /// `cargo run --bin md-previewer-server` against this package's sources.
    Interpreted,
}

/// A resolved way to start the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    pub kind: LaunchKind,
    pub program: PathBuf,
    /// Arguments placed before the forwarded server flags.
    pub prefix: Vec<OsString>,
}

impl Launcher {
    /// Resolve the server next to the running executable.
    ///
    /// Looks in `<exe_dir>/bin`, then `<exe_dir>`.
    pub fn find() -> Result<Self> {
        let exe = std::env::current_exe().map_err(|e| PreviewError::ServerLaunch(e.to_string()))?;
        let exe_dir = exe
            .parent()
            .ok_or_else(|| PreviewError::ServerLaunch("executable has no parent directory".into()))?;
        let dirs = [exe_dir.join("bin"), exe_dir.to_path_buf()];
        Self::find_in(&dirs, interpreted_fallback())
    }

    /// Resolution over explicit directories, for a given fallback.
    pub fn find_in(dirs: &[PathBuf], fallback: Option<Launcher>) -> Result<Self> {
        let candidates = [
            (LaunchKind::Platform, platform_binary_name()),
            (LaunchKind::Generic, generic_binary_name()),
        ];

        for (kind, name) in &candidates {
            for dir in dirs {
                let program = dir.join(name);
                if program.is_file() {
                    return Ok(Self {
                        kind: *kind,
                        program,
                        prefix: Vec::new(),
                    });
                }
            }
        }

        fallback.ok_or_else(|| {
            let searched: Vec<_> = dirs.iter().map(|d| d.display().to_string()).collect();
            PreviewError::ServerLaunch(format!(
                "no `{}` in [{}] and `cargo` is not available",
                generic_binary_name(),
                searched.join(", ")
            ))
        })
    }

    /// A `Command` with the launcher prefix applied.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix);
        cmd
    }
}

pub fn platform_binary_name() -> String {
    format!(
        "{SERVER_BIN}-{}-{}{}",
        std::env::consts::OS,
        std::env::consts::ARCH,
        std::env::consts::EXE_SUFFIX
    )
}

pub fn generic_binary_name() -> String {
    format!("{SERVER_BIN}{}", std::env::consts::EXE_SUFFIX)
}

/// `cargo run` against the manifest this binary was built from, when both
/// `cargo` and the manifest are still around.
fn interpreted_fallback() -> Option<Launcher> {
    let manifest = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
    if !manifest.is_file() {
        return None;
    }
    let cargo = which::which("cargo").ok()?;
    Some(Launcher {
        kind: LaunchKind::Interpreted,
        program: cargo,
        prefix: vec![
            "run".into(),
            "--quiet".into(),
            "--bin".into(),
            SERVER_BIN.into(),
            "--manifest-path".into(),
            manifest.into_os_string(),
            "--".into(),
        ],
    })
}
