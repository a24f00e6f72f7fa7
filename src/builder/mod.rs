//! Builder: source file → rendered, path-rewritten artifact on disk.
//!
//! ```text
//! read source → RenderCache → rewrite asset paths → Handoff (atomic)
//! ```
//!
//! On any error the previous artifact is left untouched, so the browser
//! keeps showing the last good preview.

mod rewrite;

pub use rewrite::{IMAGES_PREFIX, asset_url, rewrite_asset_paths};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::cache::{CacheStats, ContentHash, RenderCache};
use crate::error::{PreviewError, Result};
use crate::handoff::Handoff;
use crate::render::{MarkdownRenderer, Renderer};

/// What one successful build produced.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub source: PathBuf,
    pub fingerprint: ContentHash,
    pub cache_hit: bool,
    pub bytes: usize,
    pub elapsed: Duration,
}

/// Renders the watched file and persists the artifact.
///
/// Owns the render cache; there is exactly one writer of the handoff files.
pub struct Builder<R = MarkdownRenderer> {
    cache: RenderCache<R>,
    handoff: Handoff,
}

impl Builder<MarkdownRenderer> {
    /// Builder with the default markdown renderer.
    pub fn markdown(handoff: Handoff, cache_capacity: usize) -> Self {
        Self::new(MarkdownRenderer::default(), handoff, cache_capacity)
    }
}

impl<R: Renderer> Builder<R> {
    pub fn new(renderer: R, handoff: Handoff, cache_capacity: usize) -> Self {
        Self {
            cache: RenderCache::new(renderer, cache_capacity),
            handoff,
        }
    }

    pub fn handoff(&self) -> &Handoff {
        &self.handoff
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Build `file` into the handoff location.
    ///
    /// `file` must be absolute; its parent is the asset root written to
    /// `filePath.txt`.
    pub fn build(&mut self, file: &Path) -> Result<BuildReport> {
        let started = Instant::now();

        if !file.is_file() {
            return Err(PreviewError::SourceNotFound(file.to_path_buf()));
        }
        let source_dir = file
            .parent()
            .ok_or_else(|| PreviewError::SourceNotFound(file.to_path_buf()))?;

        let source = fs::read_to_string(file).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PreviewError::SourceNotFound(file.to_path_buf()),
            _ => PreviewError::io(file, e),
        })?;

        let rendered = self.cache.get_or_render(&source)?;
        let html = rewrite_asset_paths(&rendered.html, source_dir);

        self.handoff.write_source_dir(source_dir)?;
        self.handoff.write_artifact(&html)?;

        let report = BuildReport {
            source: file.to_path_buf(),
            fingerprint: rendered.fingerprint,
            cache_hit: rendered.cache_hit,
            bytes: html.len(),
            elapsed: started.elapsed(),
        };
        crate::debug!("build"; "{} -> {} ({} bytes, cache {})",
            file.display(),
            self.handoff.artifact_path().display(),
            report.bytes,
            if report.cache_hit { "hit" } else { "miss" });
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderError;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Handoff, PathBuf) {
        let temp = TempDir::new().unwrap();
        let handoff = Handoff::new(temp.path().join("handoff"));
        let docs = temp.path().join("docs");
        fs::create_dir_all(&docs).unwrap();
        (temp, handoff, docs.join("doc.md"))
    }

    #[test]
    fn test_build_writes_artifact_and_source_dir() {
        let (_temp, handoff, file) = setup();
        fs::write(&file, "# Hi").unwrap();
        let mut builder = Builder::markdown(handoff.clone(), 8);

        let report = builder.build(&file).unwrap();

        let html = handoff.read_artifact().unwrap();
        assert!(html.contains("<h1 id=\"hi\">"), "{html}");
        assert!(html.contains(">Hi</a></h1>"));
        assert_eq!(handoff.read_source_dir().unwrap(), file.parent().unwrap());
        assert!(!report.cache_hit);
        assert_eq!(report.bytes, html.len());
    }

    #[test]
    fn test_unchanged_source_is_idempotent_and_hits_cache() {
        let (_temp, handoff, file) = setup();
        fs::write(&file, "# Hi\n\n![a](img/a.png)").unwrap();
        let mut builder = Builder::markdown(handoff.clone(), 8);

        builder.build(&file).unwrap();
        let first = fs::read(handoff.artifact_path()).unwrap();
        let report = builder.build(&file).unwrap();
        let second = fs::read(handoff.artifact_path()).unwrap();

        assert_eq!(first, second);
        assert!(report.cache_hit);
        assert_eq!(builder.cache_stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn test_images_are_rooted_at_source_dir() {
        let (_temp, handoff, file) = setup();
        fs::write(&file, "![a](img/a.png) ![b](https://example.com/b.png)").unwrap();
        let mut builder = Builder::markdown(handoff.clone(), 8);

        builder.build(&file).unwrap();

        let html = handoff.read_artifact().unwrap();
        let expected = format!(
            "src=\"/images{}\"",
            crate::utils::path::to_url_path(&file.parent().unwrap().join("img/a.png"))
        );
        assert!(html.contains(&expected), "{html}");
        assert!(html.contains("src=\"https://example.com/b.png\""));
    }

    #[test]
    fn test_missing_source_is_not_found() {
        let (_temp, handoff, file) = setup();
        let mut builder = Builder::markdown(handoff.clone(), 8);

        let err = builder.build(&file).unwrap_err();

        assert!(matches!(err, PreviewError::SourceNotFound(ref p) if p == &file));
        assert!(!handoff.artifact_path().exists());
    }

    #[test]
    fn test_render_failure_keeps_last_good_artifact() {
        let (_temp, handoff, file) = setup();
        let renderer = |source: &str| {
            if source.contains("boom") {
                Err(RenderError::new("boom"))
            } else {
                Ok(format!("<p>{source}</p>"))
            }
        };
        let mut builder = Builder::new(renderer, handoff.clone(), 8);

        fs::write(&file, "good").unwrap();
        builder.build(&file).unwrap();
        fs::write(&file, "boom").unwrap();
        let err = builder.build(&file).unwrap_err();

        assert!(matches!(err, PreviewError::Render(_)));
        assert_eq!(handoff.read_artifact().unwrap(), "<p>good</p>");
    }

    #[test]
    fn test_deleted_source_keeps_last_good_artifact() {
        let (_temp, handoff, file) = setup();
        fs::write(&file, "# Kept").unwrap();
        let mut builder = Builder::markdown(handoff.clone(), 8);
        builder.build(&file).unwrap();

        fs::remove_file(&file).unwrap();
        assert!(builder.build(&file).is_err());

        assert!(handoff.read_artifact().unwrap().contains("Kept"));
    }
}
