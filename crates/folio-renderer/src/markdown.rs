//! Markdown rendering via pulldown-cmark.
//!
//! Drives the pulldown-cmark event stream into semantic HTML5. Headings
//! get deduplicated anchor ids, text is HTML-escaped, and relative links
//! to `.md`/`.adoc` files are rewritten to their clean route form so they
//! resolve when served.

use std::collections::HashMap;
use std::fmt::Write;

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};

use crate::escape::escape_html;
use crate::util::{slugify, unique_id};

/// Render markdown to an HTML fragment.
pub(crate) fn render(markdown: &str, gfm: bool) -> String {
    let options = if gfm {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
    } else {
        Options::empty()
    };

    let mut writer = HtmlWriter::new();
    for event in Parser::new_ext(markdown, options) {
        writer.event(event);
    }
    writer.finish()
}

/// Heading being collected until its end tag.
struct HeadingBuf {
    level: u8,
    text: String,
    html: String,
}

/// Code block being collected until its end tag.
struct CodeBuf {
    lang: Option<String>,
    content: String,
}

/// Image whose alt text is being collected.
struct ImageBuf {
    src: String,
    title: String,
    alt: String,
}

/// Event-stream HTML writer.
struct HtmlWriter {
    output: String,
    heading: Option<HeadingBuf>,
    used_ids: HashMap<String, usize>,
    code: Option<CodeBuf>,
    image: Option<ImageBuf>,
    in_table_head: bool,
}

impl HtmlWriter {
    fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            heading: None,
            used_ids: HashMap::new(),
            code: None,
            image: None,
            in_table_head: false,
        }
    }

    fn finish(self) -> String {
        self.output
    }

    /// Push inline markup to the heading buffer or the output.
    fn push_inline(&mut self, content: &str) {
        match &mut self.heading {
            Some(heading) => heading.html.push_str(content),
            None => self.output.push_str(content),
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.output.push_str(&html),
            Event::SoftBreak => self.push_inline("\n"),
            Event::HardBreak => self.push_inline("<br>"),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(checked) => {
                self.output.push_str(if checked {
                    r#"<input type="checkbox" checked disabled>"#
                } else {
                    r#"<input type="checkbox" disabled>"#
                });
            }
            Event::FootnoteReference(_) | Event::InlineMath(_) | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                // Opening tag is written at end_tag once the id is known.
                self.heading = Some(HeadingBuf {
                    level: heading_level_to_num(level),
                    text: String::new(),
                    html: String::new(),
                });
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) if !info.is_empty() => {
                        // Fence info may carry attributes after the language.
                        info.split_whitespace().next().map(str::to_owned)
                    }
                    _ => None,
                };
                self.code = Some(CodeBuf {
                    lang,
                    content: String::new(),
                });
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::Table(_) => self.output.push_str("<table>"),
            Tag::TableHead => {
                self.in_table_head = true;
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => self.output.push_str("<tr>"),
            Tag::TableCell => {
                self.output
                    .push_str(if self.in_table_head { "<th>" } else { "<td>" });
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Link { dest_url, .. } => {
                let href = rewrite_link(&dest_url);
                let open = format!(r#"<a href="{}">"#, escape_html(&href));
                self.push_inline(&open);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image = Some(ImageBuf {
                    src: dest_url.into_string(),
                    title: title.into_string(),
                    alt: String::new(),
                });
            }
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.take() {
                    let id = unique_id(slugify(&heading.text), &mut self.used_ids);
                    let level = heading.level;
                    write!(
                        self.output,
                        r#"<h{level} id="{id}">{}</h{level}>"#,
                        heading.html.trim()
                    )
                    .unwrap();
                }
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    match code.lang {
                        Some(lang) => write!(
                            self.output,
                            r#"<pre><code class="language-{}">{}</code></pre>"#,
                            escape_html(&lang),
                            escape_html(&code.content)
                        )
                        .unwrap(),
                        None => write!(
                            self.output,
                            "<pre><code>{}</code></pre>",
                            escape_html(&code.content)
                        )
                        .unwrap(),
                    }
                }
            }
            TagEnd::List(ordered) => {
                self.output.push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.in_table_head = false;
                self.output.push_str("</tr></thead><tbody>");
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output
                    .push_str(if self.in_table_head { "</th>" } else { "</td>" });
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                if let Some(image) = self.image.take() {
                    let title_attr = if image.title.is_empty() {
                        String::new()
                    } else {
                        format!(r#" title="{}""#, escape_html(&image.title))
                    };
                    write!(
                        self.output,
                        r#"<img src="{}"{title_attr} alt="{}">"#,
                        escape_html(&image.src),
                        escape_html(&image.alt)
                    )
                    .unwrap();
                }
            }
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
        }
    }

    fn text(&mut self, text: &str) {
        if let Some(code) = &mut self.code {
            code.content.push_str(text);
        } else if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else if let Some(heading) = &mut self.heading {
            heading.text.push_str(text);
            heading.html.push_str(&escape_html(text));
        } else {
            let escaped = escape_html(text).into_owned();
            self.output.push_str(&escaped);
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(heading) = &mut self.heading {
            heading.text.push_str(code);
            write!(heading.html, "<code>{}</code>", escape_html(code)).unwrap();
        } else {
            write!(self.output, "<code>{}</code>", escape_html(code)).unwrap();
        }
    }
}

/// Convert a pulldown heading level to its numeric value.
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Rewrite a link target so it resolves against served routes.
///
/// Links to `.md`/`.adoc` files lose their extension, and a trailing
/// `/index` collapses. External links, fragments, and non-content links
/// are returned unchanged.
fn rewrite_link(url: &str) -> String {
    if url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("//")
        || url.starts_with("mailto:")
        || url.starts_with("tel:")
        || url.starts_with('#')
    {
        return url.to_owned();
    }

    let (path, fragment) = match url.find('#') {
        Some(pos) => (&url[..pos], Some(&url[pos..])),
        None => (url, None),
    };

    let stripped = path
        .strip_suffix(".md")
        .or_else(|| path.strip_suffix(".adoc"));
    let Some(stripped) = stripped else {
        return url.to_owned();
    };

    let clean = match stripped.strip_suffix("/index") {
        Some(parent) => parent,
        None if stripped == "index" => "",
        None => stripped,
    };
    let clean = if clean.is_empty() { "." } else { clean };

    match fragment {
        Some(frag) => format!("{clean}{frag}"),
        None => clean.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render_gfm(markdown: &str) -> String {
        render(markdown, true)
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(render_gfm("Hello, world!"), "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading_with_id() {
        assert_eq!(
            render_gfm("## Section Title"),
            r#"<h2 id="section-title">Section Title</h2>"#
        );
    }

    #[test]
    fn test_h1_wraps_text() {
        assert_eq!(render_gfm("# Hi"), r#"<h1 id="hi">Hi</h1>"#);
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let html = render_gfm("## FAQ\n\n## FAQ\n\n## FAQ");
        assert!(html.contains(r#"id="faq""#));
        assert!(html.contains(r#"id="faq-1""#));
        assert!(html.contains(r#"id="faq-2""#));
    }

    #[test]
    fn test_duplicate_heading_id_never_collides_with_literal() {
        let html = render_gfm("## FAQ\n\n## FAQ\n\n## FAQ-1");
        assert!(html.contains(r#"id="faq""#));
        assert!(html.contains(r#"id="faq-1""#));
        assert!(html.contains(r#"id="faq-1-1""#));
        assert_eq!(html.matches(r#"id="faq-1""#).count(), 2);
    }

    #[test]
    fn test_heading_with_inline_code() {
        let html = render_gfm("## Install `cargo`");
        assert!(html.contains("<code>cargo</code>"));
        assert!(html.contains(r#"id="install-cargo""#));
    }

    #[test]
    fn test_emphasis() {
        let html = render_gfm("*italic* and **bold** and ~~gone~~");
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<s>gone</s>"));
    }

    #[test]
    fn test_code_block_with_language() {
        let html = render_gfm("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<pre><code class="language-rust">"#));
        assert!(html.contains("fn main() {}"));
    }

    #[test]
    fn test_code_block_escapes_html() {
        let html = render_gfm("```\n<script>alert(1)</script>\n```");
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn test_text_escapes_html() {
        let html = render_gfm("a < b & c > d");
        assert_eq!(html, "<p>a &lt; b &amp; c &gt; d</p>");
    }

    #[test]
    fn test_blockquote() {
        let html = render_gfm("> Quoted");
        assert!(html.contains("<blockquote>"));
        assert!(html.contains("</blockquote>"));
    }

    #[test]
    fn test_lists() {
        let html = render_gfm("- a\n- b");
        assert!(html.contains("<ul><li>"));

        let html = render_gfm("1. first\n2. second");
        assert!(html.contains("<ol><li>"));

        let html = render_gfm("3. third\n4. fourth");
        assert!(html.contains(r#"<ol start="3">"#));
    }

    #[test]
    fn test_task_list() {
        let html = render_gfm("- [ ] open\n- [x] done");
        assert!(html.contains(r#"<input type="checkbox" disabled>"#));
        assert!(html.contains(r#"<input type="checkbox" checked disabled>"#));
    }

    #[test]
    fn test_table() {
        let html = render_gfm("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table><thead><tr><th>A</th><th>B</th></tr></thead><tbody>"));
        assert!(html.contains("<td>1</td><td>2</td>"));
        assert!(html.ends_with("</tbody></table>"));
    }

    #[test]
    fn test_tables_disabled_without_gfm() {
        let html = render("| A | B |\n|---|---|\n| 1 | 2 |", false);
        assert!(!html.contains("<table>"));
    }

    #[test]
    fn test_image() {
        let html = render_gfm("![Alt text](image.png)");
        assert_eq!(html, r#"<p><img src="image.png" alt="Alt text"></p>"#);
    }

    #[test]
    fn test_image_with_title() {
        let html = render_gfm(r#"![Alt](image.png "The title")"#);
        assert!(html.contains(r#"title="The title""#));
    }

    #[test]
    fn test_link_to_markdown_rewritten() {
        let html = render_gfm("[Other](other.md)");
        assert!(html.contains(r#"<a href="other">Other</a>"#));
    }

    #[test]
    fn test_hard_break_and_rule() {
        assert!(render_gfm("a  \nb").contains("<br>"));
        assert!(render_gfm("---").contains("<hr>"));
    }

    #[test]
    fn test_rewrite_link_external_unchanged() {
        assert_eq!(rewrite_link("https://example.com"), "https://example.com");
        assert_eq!(rewrite_link("mailto:a@b.c"), "mailto:a@b.c");
        assert_eq!(rewrite_link("#section"), "#section");
    }

    #[test]
    fn test_rewrite_link_strips_extensions() {
        assert_eq!(rewrite_link("other.md"), "other");
        assert_eq!(rewrite_link("notes/kafka.adoc"), "notes/kafka");
        assert_eq!(rewrite_link("../sibling.md"), "../sibling");
    }

    #[test]
    fn test_rewrite_link_index_collapses() {
        assert_eq!(rewrite_link("notes/index.md"), "notes");
        assert_eq!(rewrite_link("index.md"), ".");
    }

    #[test]
    fn test_rewrite_link_keeps_fragment() {
        assert_eq!(rewrite_link("other.md#setup"), "other#setup");
    }

    #[test]
    fn test_rewrite_link_non_content_unchanged() {
        assert_eq!(rewrite_link("image.png"), "image.png");
    }
}
