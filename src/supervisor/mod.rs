//! Process supervisor: the `md-previewer` entry point.
//!
//! Startup is strictly ordered:
//!
//! ```text
//! resolve args → validate file → first build (writes handoff files)
//!   → spawn server child → start watching
//! ```
//!
//! On Ctrl+C / SIGTERM the watch loop returns, the child is killed and
//! reaped, and the process exits 0. A child that dies on its own is
//! reported once and not restarted.

mod launcher;

pub use launcher::{LaunchKind, Launcher, SERVER_BIN, generic_binary_name, platform_binary_name};

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use parking_lot::Mutex;

use crate::builder::Builder;
use crate::cli::Cli;
use crate::config::PreviewConfig;
use crate::error::PreviewError;
use crate::handoff::Handoff;
use crate::utils::path::resolve_user_path;
use crate::watch::{EventFilter, FsWatch, SourceBuild, WatchTarget, Watcher};
use crate::{core, log};

/// How often the monitor thread polls the child.
const MONITOR_INTERVAL: Duration = Duration::from_millis(200);

/// Flags forwarded to the server child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerArgs {
    pub quiet: bool,
    pub config: Option<PathBuf>,
    pub handoff_dir: PathBuf,
    pub open_browser: bool,
}

impl ServerArgs {
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args = Vec::new();
        if self.quiet {
            args.push("--quiet".into());
        }
        if let Some(config) = &self.config {
            args.push("--config".into());
            args.push(config.clone().into_os_string());
        }
        args.push("--handoff-dir".into());
        args.push(self.handoff_dir.clone().into_os_string());
        if !self.open_browser {
            args.push("--no-open".into());
        }
        args
    }
}

/// The running server child and its exit monitor.
pub struct ServerProcess {
    child: Arc<Mutex<Child>>,
    stopping: Arc<AtomicBool>,
    monitor: Option<JoinHandle<()>>,
}

impl ServerProcess {
    pub fn spawn(launcher: &Launcher, args: &ServerArgs) -> Result<Self, PreviewError> {
        let child = launcher
            .command()
            .args(args.to_args())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| {
                PreviewError::ServerLaunch(format!("{}: {e}", launcher.program.display()))
            })?;
        crate::debug!("previewer"; "server pid {} ({:?})", child.id(), launcher.kind);

        let child = Arc::new(Mutex::new(child));
        let stopping = Arc::new(AtomicBool::new(false));
        let monitor = spawn_monitor(Arc::clone(&child), Arc::clone(&stopping));

        Ok(Self {
            child,
            stopping,
            monitor: Some(monitor),
        })
    }

    /// Whether the child has not exited yet.
    pub fn is_running(&self) -> bool {
        matches!(self.child.lock().try_wait(), Ok(None))
    }

    /// Kill and reap the child.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if self.stopping.swap(true, Ordering::SeqCst) {
            return;
        }
        {
            let mut child = self.child.lock();
            if let Ok(None) = child.try_wait() {
                let _ = child.kill();
            }
            let _ = child.wait();
        }
        if let Some(monitor) = self.monitor.take() {
            let _ = monitor.join();
        }
    }
}

impl Drop for ServerProcess {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn_monitor(child: Arc<Mutex<Child>>, stopping: Arc<AtomicBool>) -> JoinHandle<()> {
    std::thread::spawn(move || {
        while !stopping.load(Ordering::SeqCst) {
            let status = child.lock().try_wait();
            match status {
                Ok(Some(status)) => {
                    if is_unexpected_exit(stopping.load(Ordering::SeqCst), core::is_shutdown()) {
                        let err = PreviewError::ChildProcessExit(status);
                        log!("previewer"; "{}; press Ctrl+C to exit", err);
                    }
                    return;
                }
                Ok(None) => std::thread::sleep(MONITOR_INTERVAL),
                Err(e) => {
                    log!("previewer"; "cannot poll server process: {}", e);
                    return;
                }
            }
        }
    })
}

/// Whether a child exit should be reported. Ctrl+C reaches the child too,
/// so it can exit before `stopping` is set.
fn is_unexpected_exit(stopping: bool, shutdown: bool) -> bool {
    !stopping && !shutdown
}

/// Validate the `--file` argument into an absolute, existing path.
pub fn resolve_source(raw: Option<&str>) -> Result<PathBuf, PreviewError> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| PreviewError::InvalidArgument("No file specified".into()))?;
    let path = resolve_user_path(raw);
    if !path.is_file() {
        return Err(PreviewError::SourceNotFound(path));
    }
    Ok(path)
}

/// Run the watcher/builder process until shutdown.
pub fn run(cli: &Cli) -> Result<()> {
    let file = resolve_source(cli.file.as_deref())?;
    let config = PreviewConfig::load(cli.config.as_deref(), Some(&file))?;
    let handoff = config.handoff();

    let Started {
        builder,
        server,
        shutdown,
    } = start(&file, &config, &handoff, cli.quiet, Launcher::find)?;

    let watcher = Watcher::new(SourceBuild::new(builder, &file), config.watch.debounce());
    let target = WatchTarget::for_file(&file, config.watch.recursive)?;
    let _fs = FsWatch::start(&target, EventFilter::new(handoff.dir(), &file), watcher.notifier())
        .with_context(|| format!("Failed to watch {}", target.dir.display()))?;
    log!("watch"; "watching {}", target.dir.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| anyhow!("failed to start watch runtime: {e}"))?;
    runtime.block_on(watcher.run(shutdown));

    server.shutdown();
    log!("previewer"; "stopped");
    Ok(())
}

/// Everything `run` needs once the server is up.
struct Started {
    builder: Builder,
    server: ServerProcess,
    shutdown: tokio::sync::watch::Receiver<bool>,
}

/// First build, then the server child. The child reads both handoff files
/// as soon as it starts, so it is never spawned before they exist.
fn start(
    file: &Path,
    config: &PreviewConfig,
    handoff: &Handoff,
    quiet: bool,
    find_launcher: impl FnOnce() -> Result<Launcher, PreviewError>,
) -> Result<Started> {
    let mut builder = Builder::markdown(handoff.clone(), config.cache.capacity);
    let report = builder
        .build(file)
        .with_context(|| format!("Initial build of {} failed", file.display()))?;
    log!("previewer"; "{} ({} bytes)", file.display(), report.bytes);
    crate::debug!("previewer"; "artifact at {}", handoff.artifact_path().display());

    // Register before spawning so a signal never orphans the child.
    let shutdown = core::register_watcher();

    let launcher = find_launcher()?;
    let server = ServerProcess::spawn(
        &launcher,
        &ServerArgs {
            quiet,
            config: config.path.clone(),
            handoff_dir: handoff.dir().to_path_buf(),
            open_browser: config.serve.open_browser,
        },
    )?;

    Ok(Started {
        builder,
        server,
        shutdown,
    })
}
