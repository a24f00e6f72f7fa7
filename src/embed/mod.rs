//! Embedded static resources for the preview page.
//!
//! Everything the browser needs ships inside the server binary: the HTML
//! shell, its stylesheet and the reload client.
//!
//! ```ignore
//! use embed::serve::{SHELL_HTML, ShellVars};
//!
//! let page = SHELL_HTML.render(&ShellVars { title: "doc.md", content: &artifact });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use std::borrow::Cow;

    use super::{Template, TemplateVars};
    use crate::utils::html::escape;

    /// Stylesheet inlined into the shell.
    pub const STYLES_CSS: &str = include_str!("serve/styles.css");

    /// Reload client inlined into the shell.
    pub const CLIENT_JS: &str = include_str!("serve/client.js");

    /// The exact payload that makes the client reload.
    pub const RELOAD_MESSAGE: &str = "reload";

    /// Variables for shell.html.
    pub struct ShellVars<'a> {
        pub title: &'a str,
        /// Rendered artifact, inserted verbatim.
        pub content: &'a str,
    }

    impl TemplateVars for ShellVars<'_> {
        fn get(&self, name: &str) -> Option<Cow<'_, str>> {
            match name {
                "TITLE" => Some(escape(self.title)),
                "STYLES" => Some(Cow::Borrowed(STYLES_CSS)),
                "CLIENT" => Some(Cow::Borrowed(CLIENT_JS)),
                "CONTENT" => Some(Cow::Borrowed(self.content)),
                _ => None,
            }
        }
    }

    /// Fixed HTML shell wrapping every served artifact.
    pub const SHELL_HTML: Template<ShellVars<'static>> =
        Template::new(include_str!("serve/shell.html"));
}
