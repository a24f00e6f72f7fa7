//! Watcher: filesystem events → debounced, serialized rebuilds.
//!
//! ```text
//! notify callback → ChangeNotifier ─┐
//!                                   ├─▶ Debouncer (Idle/Pending/Building) ─▶ spawn_blocking(rebuild)
//! build done ───────────────────────┘
//! ```
//!
//! At most one rebuild runs at a time. Changes that arrive during a build
//! are queued as a single follow-up, debounced again from build completion.
//! Rebuild errors are logged; the loop keeps running.

mod debouncer;
mod filter;


pub use debouncer::DEBOUNCE_MS;
pub use filter::EventFilter;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use tokio::sync::{mpsc, watch};

use crate::builder::Builder;
use crate::error::{PreviewError, Result};
use crate::logger;
use crate::render::Renderer;
use debouncer::Debouncer;

/// A unit of work the watcher runs after each settled change.
pub trait Rebuild: Send + 'static {
    fn rebuild(&mut self) -> Result<()>;
}

impl<F> Rebuild for F
where
    F: FnMut() -> Result<()> + Send + 'static,
{
    fn rebuild(&mut self) -> Result<()> {
        self()
    }
}

/// Rebuilds one source file and reports the outcome on the status line.
pub struct SourceBuild<R> {
    builder: Builder<R>,
    file: PathBuf,
}

impl<R: Renderer> SourceBuild<R> {
    pub fn new(builder: Builder<R>, file: impl Into<PathBuf>) -> Self {
        Self {
            builder,
            file: file.into(),
        }
    }
}

impl<R: Renderer + Send + 'static> Rebuild for SourceBuild<R> {
    fn rebuild(&mut self) -> Result<()> {
        let report = self.builder.build(&self.file)?;
        let name = display_name(&self.file);
        let ms = report.elapsed.as_millis();
        if report.cache_hit {
            logger::status_unchanged(&format!("unchanged: {name} ({ms}ms, cache hit)"));
        } else {
            logger::status_success(&format!("rebuilt: {name} ({ms}ms)"));
        }
        Ok(())
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Directory observed for changes, derived from the source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    pub dir: PathBuf,
    pub recursive: bool,
}

impl WatchTarget {
    /// Target for `file`'s parent directory.
    pub fn for_file(file: &Path, recursive: bool) -> Result<Self> {
        let dir = file
            .parent()
            .ok_or_else(|| PreviewError::SourceNotFound(file.to_path_buf()))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            recursive,
        })
    }

    fn mode(&self) -> RecursiveMode {
        if self.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        }
    }
}

/// Cloneable handle that signals "something changed" to a [`Watcher`].
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: mpsc::UnboundedSender<()>,
}

impl ChangeNotifier {
    /// Returns `false` once the watcher has stopped.
    pub fn notify(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Live notify subscription. Dropping it stops event delivery.
pub struct FsWatch {
    _watcher: RecommendedWatcher,
}

impl FsWatch {
    /// Start observing `target`, forwarding relevant events to `notifier`.
    pub fn start(
        target: &WatchTarget,
        filter: EventFilter,
        notifier: ChangeNotifier,
    ) -> notify::Result<Self> {
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) if filter.is_relevant(&event) => {
                    crate::debug!("watch"; "{:?} {:?}", event.kind, event.paths);
                    notifier.notify();
                }
                Ok(_) => {}
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            })?;
        watcher.watch(&target.dir, target.mode())?;
        Ok(Self { _watcher: watcher })
    }
}

/// Debounced rebuild loop.
pub struct Watcher<B> {
    debouncer: Debouncer,
    task: Arc<Mutex<B>>,
    changes_tx: mpsc::UnboundedSender<()>,
    changes_rx: mpsc::UnboundedReceiver<()>,
}

impl<B: Rebuild> Watcher<B> {
    pub fn new(task: B, debounce: Duration) -> Self {
        let (changes_tx, changes_rx) = mpsc::unbounded_channel();
        Self {
            debouncer: Debouncer::new(debounce),
            task: Arc::new(Mutex::new(task)),
            changes_tx,
            changes_rx,
        }
    }

    pub fn notifier(&self) -> ChangeNotifier {
        ChangeNotifier {
            tx: self.changes_tx.clone(),
        }
    }

    /// Run until `shutdown` flips to `true` (or its sender is dropped).
    ///
    /// An in-flight build is allowed to finish before returning.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Result<()>>();
        let idle = Duration::from_secs(86400);

        loop {
            if *shutdown.borrow() {
                break;
            }

            let wake = self
                .debouncer
                .deadline()
                .unwrap_or_else(|| Instant::now() + idle);

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                Some(result) = done_rx.recv() => {
                    report(result);
                    self.debouncer.finish(Instant::now());
                }
                Some(()) = self.changes_rx.recv() => {
                    self.debouncer.on_change(Instant::now());
                }
                _ = tokio::time::sleep_until(wake.into()) => {
                    if self.debouncer.try_start(Instant::now()) {
                        self.spawn_build(done_tx.clone());
                    }
                }
            }
        }

        if self.debouncer.is_building()
            && let Some(result) = done_rx.recv().await
        {
            report(result);
        }
        crate::debug!("watch"; "stopped");
    }

    fn spawn_build(&self, done_tx: mpsc::UnboundedSender<Result<()>>) {
        let task = Arc::clone(&self.task);
        tokio::task::spawn_blocking(move || {
            let result = task.lock().rebuild();
            let _ = done_tx.send(result);
        });
    }
}

fn report(result: Result<()>) {
    if let Err(e) = result {
        let detail = std::error::Error::source(&e)
            .map(ToString::to_string)
            .unwrap_or_default();
        logger::status_error(&format!("build failed: {e}"), &detail);
    }
}
