//! Markdown to HTML using pulldown-cmark.

use pulldown_cmark::{CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};

use super::{RenderError, Renderer, Slugger};
use crate::utils::html::escape_attr;

/// Options for markdown conversion
#[derive(Debug, Clone, Default)]
pub struct MarkdownOptions {
    /// Enable tables extension
    pub tables: bool,
    /// Enable footnotes extension
    pub footnotes: bool,
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable task lists extension
    pub task_lists: bool,
    /// Enable heading attributes extension (e.g., `# Heading {#custom-id}`)
    pub heading_attributes: bool,
    /// Enable `$inline$` and `$$display$$` math
    pub math: bool,
    /// Enable GFM blockquote tags (`> [!NOTE]`)
    pub gfm: bool,
    /// Wrap heading content in a self-link (`<a class="anchor">`)
    pub heading_anchors: bool,
}

impl MarkdownOptions {
    /// Create options with all extensions enabled
    pub fn all() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
            heading_attributes: true,
            math: true,
            gfm: true,
            heading_anchors: true,
        }
    }

    /// Convert to pulldown-cmark Options
    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        if self.heading_attributes {
            opts.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        if self.math {
            opts.insert(Options::ENABLE_MATH);
        }
        if self.gfm {
            opts.insert(Options::ENABLE_GFM);
        }
        opts
    }
}

/// Default renderer: GFM-flavored markdown with slugged, self-linking headings.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    options: MarkdownOptions,
}

impl MarkdownRenderer {
    pub fn new(options: MarkdownOptions) -> Self {
        Self { options }
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(MarkdownOptions::all())
    }
}

impl Renderer for MarkdownRenderer {
    fn render(&self, source: &str) -> Result<String, RenderError> {
        let parser = Parser::new_ext(source, self.options.to_pulldown_options());

        let mut out = String::with_capacity(source.len() + source.len() / 2);
        if self.options.heading_anchors {
            html::push_html(&mut out, with_heading_anchors(parser).into_iter());
        } else {
            html::push_html(&mut out, parser);
        }
        Ok(out)
    }
}

/// A heading whose events are buffered until its end tag, so the id can be
/// computed from the full text.
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    body: Vec<Event<'a>>,
}

impl PendingHeading<'_> {
    fn plain_text(&self) -> String {
        self.body
            .iter()
            .filter_map(|event| match event {
                Event::Text(text) | Event::Code(text) | Event::InlineMath(text) => Some(&**text),
                _ => None,
            })
            .collect()
    }

    fn open_tag(&self, id: &str) -> String {
        let tag = heading_tag(self.level);
        let id = escape_attr(id);
        let mut open = format!("<{tag} id=\"{id}\"");
        if !self.classes.is_empty() {
            let classes: Vec<&str> = self.classes.iter().map(|c| &**c).collect();
            open.push_str(&format!(" class=\"{}\"", escape_attr(&classes.join(" "))));
        }
        for (key, value) in &self.attrs {
            match value {
                Some(value) => {
                    open.push_str(&format!(" {}=\"{}\"", &**key, escape_attr(value)));
                }
                None => open.push_str(&format!(" {}", &**key)),
            }
        }
        open.push_str(&format!("><a class=\"anchor\" href=\"#{id}\">"));
        open
    }
}

/// Rewrite heading events into `<hN id=..><a class="anchor" href="#..">..</a></hN>`.
fn with_heading_anchors<'a>(events: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
    let mut slugger = Slugger::new();
    let mut out = Vec::new();
    let mut pending: Option<PendingHeading<'a>> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                pending = Some(PendingHeading {
                    level,
                    id,
                    classes,
                    attrs,
                    body: Vec::new(),
                });
            }
            Event::End(TagEnd::Heading(level)) => {
                let Some(heading) = pending.take() else {
                    continue;
                };
                let id = match &heading.id {
                    Some(explicit) => slugger.reserve(explicit),
                    None => slugger.slug(&heading.plain_text()),
                };
                out.push(Event::Html(heading.open_tag(&id).into()));
                out.extend(heading.body);
                out.push(Event::Html(format!("</a></{}>\n", heading_tag(level)).into()));
            }
            other => match pending.as_mut() {
                Some(heading) => heading.body.push(other),
                None => out.push(other),
            },
        }
    }

    out
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(source: &str) -> String {
        MarkdownRenderer::default().render(source).unwrap()
    }

    #[test]
    fn test_heading_gets_id_and_anchor() {
        let html = render("# Hi");
        assert!(html.contains("<h1 id=\"hi\">"), "{html}");
        assert!(html.contains("<a class=\"anchor\" href=\"#hi\">Hi</a></h1>"), "{html}");
    }

    #[test]
    fn test_duplicate_headings_are_suffixed() {
        let html = render("## Setup\n\ntext\n\n## Setup\n");
        assert!(html.contains("<h2 id=\"setup\">"));
        assert!(html.contains("<h2 id=\"setup-1\">"));
    }

    #[test]
    fn test_explicit_heading_id_wins() {
        let html = render("# Title {#custom .big}");
        assert!(html.contains("<h1 id=\"custom\" class=\"big\">"), "{html}");
    }

    #[test]
    fn test_heading_with_inline_code() {
        let html = render("# Use `cargo` now");
        assert!(html.contains("id=\"use-cargo-now\""), "{html}");
        assert!(html.contains("<code>cargo</code>"));
    }

    #[test]
    fn test_code_block_language_class() {
        let html = render("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<code class=\"language-rust\">"));
    }

    #[test]
    fn test_gfm_extensions() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~old~~\n\n- [x] done\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>old</del>"));
        assert!(html.contains("type=\"checkbox\""));
    }

    #[test]
    fn test_math_spans() {
        let html = render("inline $x^2$ math");
        assert!(html.contains("class=\"math math-inline\""), "{html}");
    }

    #[test]
    fn test_anchors_can_be_disabled() {
        let renderer = MarkdownRenderer::new(MarkdownOptions {
            heading_anchors: false,
            ..MarkdownOptions::all()
        });
        let html = renderer.render("# Hi").unwrap();
        assert_eq!(html.trim(), "<h1>Hi</h1>");
    }

    #[test]
    fn test_render_is_deterministic() {
        let source = "# A\n\n# A\n\nparagraph ![img](a.png)";
        assert_eq!(render(source), render(source));
    }
}
