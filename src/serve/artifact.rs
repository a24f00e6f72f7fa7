//! Artifact watch: `index.html` replaced → one `reload` broadcast.

use std::path::Path;
use std::time::Duration;

use crossbeam::channel::{self, RecvTimeoutError};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher as _};

use super::push::ConnectionSet;
use crate::embed::serve::RELOAD_MESSAGE;
use crate::handoff::{ARTIFACT_FILE, Handoff};

/// Live subscription on the handoff directory.
///
/// Dropping it stops the notify watcher; the broadcast thread then exits.
pub struct ArtifactWatch {
    _watcher: RecommendedWatcher,
}

impl ArtifactWatch {
    /// Watch `handoff` and broadcast a reload to `clients` whenever the
    /// artifact is replaced.
    ///
    /// A single atomic replace shows up as several events (create, rename);
    /// events closer together than `debounce` yield one broadcast.
    pub fn start(
        handoff: &Handoff,
        clients: ConnectionSet,
        debounce: Duration,
    ) -> notify::Result<Self> {
        let (tx, rx) = channel::unbounded::<()>();

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) if is_artifact_change(&event) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => crate::log!("serve"; "artifact watch error: {}", e),
            })?;
        watcher.watch(handoff.dir(), RecursiveMode::NonRecursive)?;

        std::thread::spawn(move || {
            // Block for the first event of a burst, then wait for quiet.
            while rx.recv().is_ok() {
                loop {
                    match rx.recv_timeout(debounce) {
                        Ok(()) => continue,
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => return,
                    }
                }
                let delivered = clients.broadcast(RELOAD_MESSAGE);
                crate::debug!("serve"; "artifact changed, reloaded {} clients", delivered);
            }
        });

        Ok(Self { _watcher: watcher })
    }
}

fn is_artifact_change(event: &notify::Event) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.iter().any(|path| is_artifact(path))
}

fn is_artifact(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == ARTIFACT_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn event(kind: EventKind, paths: &[&str]) -> notify::Event {
        notify::Event {
            kind,
            paths: paths.iter().map(PathBuf::from).collect(),
            attrs: Default::default(),
        }
    }

    #[test]
    fn test_only_artifact_file_counts() {
        let rename = EventKind::Modify(notify::event::ModifyKind::Name(
            notify::event::RenameMode::Both,
        ));
        assert!(is_artifact_change(&event(
            rename,
            &["/tmp/ns/.index.html.42.tmp", "/tmp/ns/index.html"]
        )));
        assert!(!is_artifact_change(&event(rename, &["/tmp/ns/filePath.txt"])));
    }

    #[test]
    fn test_reads_are_ignored() {
        let read = EventKind::Access(notify::event::AccessKind::Read);
        assert!(!is_artifact_change(&event(read, &["/tmp/ns/index.html"])));
    }
}
