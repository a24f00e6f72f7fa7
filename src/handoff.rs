//! Filesystem handoff between the watcher and server processes.
//!
//! Two files under `<tmp>/<namespace>/`:
//!
//! - `index.html`: the latest rendered artifact.
//! - `filePath.txt`: absolute source directory, one line, no newline.
//!
//! Latest value wins; neither file is a log. Every write goes to a sibling
//! temp file first and is then renamed over the target, so a reader sees the
//! old document or the new one, never a prefix.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::Builder as TempFileBuilder;

use crate::error::{PreviewError, Result};

/// Default directory name under the system temp dir.
pub const DEFAULT_NAMESPACE: &str = "md-previewer-tmp";

/// Rendered artifact file name.
pub const ARTIFACT_FILE: &str = "index.html";

/// Source directory marker file name.
pub const SOURCE_DIR_FILE: &str = "filePath.txt";

/// Location of the handoff files. Cheap to clone; holds no file handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handoff {
    dir: PathBuf,
}

impl Handoff {
    /// Handoff rooted at an explicit directory (tests, `--handoff-dir`).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Handoff at `<system tmp>/<namespace>`.
    ///
    /// `std::env::temp_dir` honors `TMPDIR` on Unix and `TMP`/`TEMP` on Windows.
    pub fn in_temp_dir(namespace: &str) -> Self {
        Self::new(std::env::temp_dir().join(namespace))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.dir.join(ARTIFACT_FILE)
    }

    pub fn source_dir_path(&self) -> PathBuf {
        self.dir.join(SOURCE_DIR_FILE)
    }

    /// Replace the artifact atomically.
    pub fn write_artifact(&self, html: &str) -> Result<()> {
        write_atomic(&self.artifact_path(), html.as_bytes())
    }

    /// Replace the source directory marker atomically.
    pub fn write_source_dir(&self, source_dir: &Path) -> Result<()> {
        let text = source_dir.to_string_lossy();
        write_atomic(&self.source_dir_path(), text.as_bytes())
    }

    /// Read the current artifact.
    pub fn read_artifact(&self) -> std::io::Result<String> {
        fs::read_to_string(self.artifact_path())
    }

    /// Read the source directory marker.
    ///
    /// Surrounding whitespace is ignored, so a hand-edited file with a
    /// trailing newline still works.
    pub fn read_source_dir(&self) -> std::io::Result<PathBuf> {
        let text = fs::read_to_string(self.source_dir_path())?;
        Ok(PathBuf::from(text.trim()))
    }
}

/// Write `bytes` to a temp sibling, then rename it over `path`.
///
/// Creates parent directories as needed. The temp name starts with `.` so
/// watchers filtering on the final file name never see it; it is removed
/// on any failure.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| PreviewError::io(path, std::io::Error::other("path has no parent")))?;
    fs::create_dir_all(parent).map_err(|e| PreviewError::io(parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut tmp = TempFileBuilder::new()
        .prefix(&format!(".{file_name}."))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| PreviewError::io(parent, e))?;

    tmp.write_all(bytes)
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| PreviewError::io(tmp.path(), e))?;

    tmp.persist(path).map_err(|e| PreviewError::io(path, e.error))?;
    Ok(())
}
