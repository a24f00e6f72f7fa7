//! HTTP response handlers.

use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{Result, anyhow};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::builder::{IMAGES_PREFIX, rewrite_asset_paths};
use crate::embed::serve::{SHELL_HTML, ShellVars};
use crate::error::PreviewError;
use crate::handoff::Handoff;
use crate::utils::mime::{self, types};
use crate::utils::path::from_url_path;

/// Title used when the source directory is unknown.
const DEFAULT_TITLE: &str = "md-previewer";

/// `GET /`: the artifact inside the fixed shell.
pub fn respond_index(request: Request, handoff: &Handoff) -> Result<()> {
    match render_index(handoff) {
        Ok(page) => send_body(request, 200, types::HTML, page.into_bytes()),
        Err(e) => respond_error(request, &e),
    }
}

/// Read the artifact and wrap it. Relative `src` values still present are
/// rewritten against `filePath.txt`; already-rewritten ones are unchanged.
pub fn render_index(handoff: &Handoff) -> Result<String, PreviewError> {
    let artifact = handoff
        .read_artifact()
        .map_err(|e| PreviewError::serve(handoff.artifact_path(), e))?;

    let source_dir = handoff.read_source_dir().ok();
    let content = match &source_dir {
        Some(dir) => rewrite_asset_paths(&artifact, dir),
        None => artifact.as_str().into(),
    };
    let title = source_dir
        .as_deref()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());

    Ok(SHELL_HTML.render(&ShellVars {
        title: &title,
        content: &content,
    }))
}

/// `GET /images/<abs path>`: a local file by absolute path.
pub fn respond_image(request: Request) -> Result<()> {
    let Some(path) = image_path(request.url()) else {
        return respond_not_found(request);
    };

    match fs::read(&path) {
        Ok(body) => send_body(request, 200, mime::from_path(&path), body),
        Err(e) => respond_error(request, &PreviewError::serve(&path, e)),
    }
}

/// Map `/images/<url path>` to a filesystem path.
///
/// Query strings are dropped, escapes decoded, and any `..` segment
/// rejected.
pub fn image_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix(IMAGES_PREFIX)?;
    if !rest.starts_with('/') {
        return None;
    }
    let path = from_url_path(rest)?;
    if path.components().any(|c| c == Component::ParentDir) {
        return None;
    }
    path.is_absolute().then_some(path)
}

pub fn respond_not_found(request: Request) -> Result<()> {
    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec())
}

/// Map a serving error to 404/500. Never fatal for the server.
pub fn respond_error(request: Request, error: &PreviewError) -> Result<()> {
    let status = error.status_code();
    if status >= 500 {
        crate::log!("serve"; "{}: {}", error, std::error::Error::source(error)
            .map(ToString::to_string)
            .unwrap_or_default());
    } else {
        crate::debug!("serve"; "{}", error);
    }
    let body = match status {
        404 => b"404 Not Found".to_vec(),
        _ => b"500 Internal Server Error".to_vec(),
    };
    send_body(request, status, types::PLAIN, body)
}

fn send_body(request: Request, status: u16, content_type: &'static str, body: Vec<u8>) -> Result<()> {
    let header = make_header("Content-Type", content_type)?;
    let no_store = make_header("Cache-Control", "no-store")?;

    if request.method() == &Method::Head {
        let response = Response::empty(StatusCode(status))
            .with_header(header)
            .with_header(no_store);
        return request.respond(response).map_err(Into::into);
    }

    let response = Response::from_data(body)
        .with_status_code(StatusCode(status))
        .with_header(header)
        .with_header(no_store);
    request.respond(response)?;
    Ok(())
}

pub(super) fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key, value).map_err(|()| anyhow!("invalid header {key}: {value}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_image_path_decodes_and_strips_query() {
        assert_eq!(
            image_path("/images/docs/my%20img.png?v=2"),
            Some(PathBuf::from("/docs/my img.png"))
        );
    }

    #[test]
    fn test_image_path_rejects_traversal() {
        assert_eq!(image_path("/images/docs/../etc/passwd"), None);
        assert_eq!(image_path("/images/docs/%2E%2E/etc/passwd"), None);
    }

    #[test]
    fn test_image_path_requires_prefix_segment() {
        assert_eq!(image_path("/imagesfoo/a.png"), None);
        assert_eq!(image_path("/other/a.png"), None);
    }

    #[test]
    fn test_render_index_wraps_artifact() {
        let temp = TempDir::new().unwrap();
        let handoff = Handoff::new(temp.path());
        handoff.write_source_dir(Path::new("/docs")).unwrap();
        handoff.write_artifact("<h1 id=\"hi\">Hi</h1>\n<img src=\"b.png\">").unwrap();

        let page = render_index(&handoff).unwrap();

        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<h1 id=\"hi\">Hi</h1>"));
        assert!(page.contains("src=\"/images/docs/b.png\""));
        assert!(page.contains("<title>docs</title>"));
    }

    #[test]
    fn test_render_index_without_artifact_is_404() {
        let temp = TempDir::new().unwrap();
        let handoff = Handoff::new(temp.path());

        let err = render_index(&handoff).unwrap_err();

        assert_eq!(err.status_code(), 404);
    }
}
