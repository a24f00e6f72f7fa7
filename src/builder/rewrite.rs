//! Relative asset reference rewriting.
//!
//! `src="img/a.png"` in a document from `/docs` becomes
//! `src="/images/docs/img/a.png"`, which the server maps back to the file.
//! External URLs and already-absolute references are left alone, which makes
//! the rewrite idempotent: the server re-applies it to whatever it reads.

use std::borrow::Cow;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::utils::html::{decode_attr, escape_attr};
use crate::utils::path::{clean_path, from_url_path, is_external_link, to_url_path};

/// URL prefix under which local images are served.
pub const IMAGES_PREFIX: &str = "/images";

static SRC_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(^|\s)src="([^"]*)""#).expect("valid src attribute regex"));

/// Rewrite every relative `src="…"` in `html` against `source_dir`.
pub fn rewrite_asset_paths<'a>(html: &'a str, source_dir: &Path) -> Cow<'a, str> {
    SRC_ATTR.replace_all(html, |caps: &Captures<'_>| {
        match asset_url(&decode_attr(&caps[2]), source_dir) {
            Some(url) => format!("{}src=\"{}\"", &caps[1], escape_attr(&url)),
            None => caps[0].to_string(),
        }
    })
}

/// Map one reference to its `/images/...` URL, or `None` if it stays as is.
///
/// `src` is the attribute value after entity decoding; percent escapes in
/// its path part are decoded before joining.
pub fn asset_url(src: &str, source_dir: &Path) -> Option<String> {
    if !is_relative_reference(src) {
        return None;
    }

    // Keep any query/fragment verbatim; only the path part is joined.
    let split = src.find(['?', '#']).unwrap_or(src.len());
    let (path_part, suffix) = src.split_at(split);
    let relative = from_url_path(path_part).unwrap_or_else(|| path_part.into());

    let absolute = clean_path(&source_dir.join(relative));
    Some(format!("{IMAGES_PREFIX}{}{suffix}", to_url_path(&absolute)))
}

fn is_relative_reference(src: &str) -> bool {
    !(src.is_empty() || src.starts_with('/') || src.starts_with('#') || is_external_link(src))
}
