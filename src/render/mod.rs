//! Source-to-HTML rendering.
//!
//! The rest of the crate only sees the [`Renderer`] trait, treated as a pure
//! function `render(source) -> html`. [`MarkdownRenderer`] is the default.

mod markdown;
mod slug;

pub use markdown::MarkdownRenderer;
pub use slug::Slugger;

use thiserror::Error;

/// Failure raised by a renderer. Propagated unchanged by the render cache.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RenderError {
    message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A deterministic source-to-HTML transform.
///
/// Same input must always give the same output; the render cache relies on it.
pub trait Renderer {
    fn render(&self, source: &str) -> Result<String, RenderError>;
}

impl<F> Renderer for F
where
    F: Fn(&str) -> Result<String, RenderError>,
{
    fn render(&self, source: &str) -> Result<String, RenderError> {
        self(source)
    }
}
