//! Conversions between filesystem paths and URL paths.

use std::path::{Path, PathBuf};

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Characters escaped when a filesystem path is embedded in a URL path.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Check if a link is external (has a URL scheme like http:, data:, etc.)
/// or is protocol-relative (`//cdn.example.com/x.png`).
///
/// A valid scheme has at least 2 characters before the colon, so Windows
/// drive letters (`C:`) are not mistaken for schemes.
///
/// # Examples
/// ```ignore
/// assert!(is_external_link("https://example.com/a.png"));
/// assert!(is_external_link("data:image/png;base64,AAAA"));
/// assert!(!is_external_link("img/a.png"));
/// ```
#[inline]
pub fn is_external_link(link: &str) -> bool {
    if link.starts_with("//") {
        return true;
    }
    link.find(':').is_some_and(|pos| {
        pos > 1
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Render an absolute filesystem path as a percent-encoded URL path.
///
/// `/docs/my img` → `/docs/my%20img`; `C:\docs` → `/C:/docs`.
pub fn to_url_path(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let encoded = utf8_percent_encode(&raw, PATH_SEGMENT).to_string();
    if encoded.starts_with('/') {
        encoded
    } else {
        format!("/{encoded}")
    }
}

/// Inverse of [`to_url_path`]: decode and strip the query string.
///
/// Returns `None` for non-UTF-8 escapes.
pub fn from_url_path(url_path: &str) -> Option<PathBuf> {
    let path = url_path.split(['?', '#']).next().unwrap_or(url_path);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;

    // `/C:/docs` on Windows names the drive path `C:/docs`.
    let bytes = decoded.as_bytes();
    if cfg!(windows) && bytes.len() >= 3 && bytes[0] == b'/' && bytes[2] == b':' {
        return Some(PathBuf::from(&decoded[1..]));
    }
    Some(PathBuf::from(decoded.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_external_link() {
        assert!(is_external_link("http://example.com/a.png"));
        assert!(is_external_link("https://example.com/a.png"));
        assert!(is_external_link("data:image/png;base64,AAAA"));
        assert!(is_external_link("//cdn.example.com/a.png"));
        assert!(!is_external_link("img/a.png"));
        assert!(!is_external_link("./a.png"));
        assert!(!is_external_link("C:/docs/a.png"));
    }

    #[test]
    fn test_to_url_path_encodes_reserved() {
        assert_eq!(to_url_path(Path::new("/docs/my img#1")), "/docs/my%20img%231");
        assert_eq!(to_url_path(Path::new("/docs/img")), "/docs/img");
    }

    #[test]
    fn test_from_url_path_decodes_and_strips_query() {
        assert_eq!(
            from_url_path("/docs/my%20img.png?v=2"),
            Some(PathBuf::from("/docs/my img.png"))
        );
    }

    #[test]
    fn test_from_url_path_rejects_bad_utf8() {
        assert_eq!(from_url_path("/docs/%FF.png"), None);
    }
}
