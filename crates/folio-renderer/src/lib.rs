//! Markdown and AsciiDoc to HTML rendering.
//!
//! This crate converts a [`Document`] into a complete HTML page by
//! rendering its body according to its declared format and substituting
//! the result into a fixed page template.
//!
//! Rendering is a pure function of the document plus the static template:
//! the same input always yields byte-identical output, and no state is
//! retained between calls. Malformed markup never fails a page; the
//! renderer recovers locally and records a warning instead.
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use folio_renderer::Renderer;
//! use folio_source::{Document, Format};
//!
//! let doc = Document::parse(PathBuf::from("hello.md"), Format::Markdown, "# Hi\n");
//! let page = Renderer::new().render(&doc);
//! assert!(page.html.contains("<h1"));
//! ```

mod asciidoc;
mod escape;
mod markdown;
mod template;
mod util;

use folio_source::{Document, Format};

pub use escape::escape_html;

/// HTML output derived from a [`Document`].
///
/// Transient: recomputed on every render, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedPage {
    /// Output route, derived from the document's source path.
    pub route: String,
    /// Resolved page title.
    pub title: String,
    /// Complete HTML page.
    pub html: String,
    /// Warnings from recovered markup errors (page still rendered).
    pub warnings: Vec<String>,
}

/// Entry in a generated listing page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// URL route of the document.
    pub route: String,
    /// Display title.
    pub title: String,
}

/// Document renderer.
///
/// Stateless apart from configuration; safe to share across requests.
pub struct Renderer {
    gfm: bool,
}

impl Renderer {
    /// Create a renderer with GitHub Flavored Markdown extensions enabled.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GFM extensions (tables, strikethrough, task lists).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Render a document to a complete HTML page.
    ///
    /// Dispatches on the document's format and wraps the resulting
    /// fragment in the page template.
    #[must_use]
    pub fn render(&self, doc: &Document) -> RenderedPage {
        let title = doc.title();
        let (fragment, warnings) = match doc.format {
            Format::Markdown => (markdown::render(&doc.body, self.gfm), Vec::new()),
            Format::Asciidoc => asciidoc::render(&doc.body),
        };

        RenderedPage {
            route: doc.route.clone(),
            html: template::page(&title, &fragment),
            title,
            warnings,
        }
    }

    /// Render a generated listing page for a set of documents.
    ///
    /// Used as the root page when the content directory has no `index.*`.
    #[must_use]
    pub fn render_listing(&self, title: &str, entries: &[IndexEntry]) -> RenderedPage {
        let mut fragment = String::new();
        fragment.push_str("<h1>");
        fragment.push_str(&escape_html(title));
        fragment.push_str("</h1><ul class=\"listing\">");
        for entry in entries {
            let href = if entry.route.is_empty() {
                "/".to_owned()
            } else {
                format!("/{}", entry.route)
            };
            fragment.push_str(&format!(
                "<li><a href=\"{}\">{}</a></li>",
                escape_html(&href),
                escape_html(&entry.title)
            ));
        }
        fragment.push_str("</ul>");

        RenderedPage {
            route: String::new(),
            html: template::page(title, &fragment),
            title: title.to_owned(),
            warnings: Vec::new(),
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
