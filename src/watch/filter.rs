use std::path::{Path, PathBuf};

use notify::EventKind;

/// Decides which raw notify events count as a change to the watch target.
#[derive(Debug, Clone)]
pub struct EventFilter {
    /// Artifact location; our own writes must never trigger a rebuild.
    handoff_dir: PathBuf,
    /// The previewed file. Always relevant, whatever its name looks like.
    source: PathBuf,
}

impl EventFilter {
    pub fn new(handoff_dir: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            handoff_dir: handoff_dir.into(),
            source: source.into(),
        }
    }

    pub fn is_relevant(&self, event: &notify::Event) -> bool {
        // Reads (including the builder's own) are not changes.
        // Metadata events are kept: `touch` must rebuild.
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }

        // Rescan notices carry no paths.
        if event.paths.is_empty() {
            return true;
        }

        event.paths.iter().any(|path| self.is_relevant_path(path))
    }

    fn is_relevant_path(&self, path: &Path) -> bool {
        if path == self.source {
            return true;
        }
        !is_temp_file(path) && !path.starts_with(&self.handoff_dir)
    }
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name == "4913"
}
