//! AsciiDoc rendering.
//!
//! A line-oriented renderer for the AsciiDoc constructs that show up in
//! plain prose documents: section titles, paragraphs, listing blocks,
//! simple lists, and the `*bold*` / `_italic_` / `` `code` `` inline
//! forms. Anything malformed renders as literal text and is reported as
//! a warning instead of failing the page.

use std::collections::HashMap;
use std::fmt::Write;

use crate::escape::escape_html;
use crate::util::{slugify, unique_id};

/// Render AsciiDoc to an HTML fragment plus recovery warnings.
pub(crate) fn render(text: &str) -> (String, Vec<String>) {
    let mut writer = AsciidocWriter::new();
    writer.render(text);
    (writer.output, writer.warnings)
}

#[derive(PartialEq)]
enum ListKind {
    Unordered,
    Ordered,
}

struct AsciidocWriter {
    output: String,
    warnings: Vec<String>,
    used_ids: HashMap<String, usize>,
}

impl AsciidocWriter {
    fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            warnings: Vec::new(),
            used_ids: HashMap::new(),
        }
    }

    fn render(&mut self, text: &str) {
        let lines: Vec<&str> = text.lines().collect();
        let mut i = 0;

        while i < lines.len() {
            let line = lines[i];
            let trimmed = line.trim_end();

            if trimmed.is_empty() {
                i += 1;
            } else if let Some((level, title)) = heading_line(trimmed) {
                self.heading(level, title);
                i += 1;
            } else if trimmed == "----" {
                i = self.listing_block(&lines, i);
            } else if list_item(trimmed, &ListKind::Unordered).is_some() {
                i = self.list(&lines, i, ListKind::Unordered);
            } else if list_item(trimmed, &ListKind::Ordered).is_some() {
                i = self.list(&lines, i, ListKind::Ordered);
            } else {
                i = self.paragraph(&lines, i);
            }
        }
    }

    fn heading(&mut self, level: u8, title: &str) {
        let id = unique_id(slugify(title), &mut self.used_ids);
        let inline = self.inline(title);
        write!(self.output, r#"<h{level} id="{id}">{inline}</h{level}>"#).unwrap();
    }

    /// Consume a `----` delimited listing block. An unterminated block
    /// runs to end of input and is reported as a warning.
    fn listing_block(&mut self, lines: &[&str], start: usize) -> usize {
        let mut i = start + 1;
        let mut content = String::new();

        loop {
            match lines.get(i) {
                Some(line) if line.trim_end() == "----" => {
                    i += 1;
                    break;
                }
                Some(line) => {
                    content.push_str(line);
                    content.push('\n');
                    i += 1;
                }
                None => {
                    self.warnings
                        .push(format!("unterminated listing block starting at line {}", start + 1));
                    break;
                }
            }
        }

        write!(
            self.output,
            "<pre><code>{}</code></pre>",
            escape_html(content.trim_end_matches('\n'))
        )
        .unwrap();
        i
    }

    fn list(&mut self, lines: &[&str], start: usize, kind: ListKind) -> usize {
        self.output
            .push_str(if kind == ListKind::Ordered { "<ol>" } else { "<ul>" });

        let mut i = start;
        while let Some(line) = lines.get(i) {
            let Some(item) = list_item(line.trim_end(), &kind) else {
                break;
            };
            let inline = self.inline(item);
            write!(self.output, "<li>{inline}</li>").unwrap();
            i += 1;
        }

        self.output
            .push_str(if kind == ListKind::Ordered { "</ol>" } else { "</ul>" });
        i
    }

    fn paragraph(&mut self, lines: &[&str], start: usize) -> usize {
        let mut i = start;
        let mut text = String::new();

        while let Some(line) = lines.get(i) {
            let trimmed = line.trim_end();
            if trimmed.is_empty()
                || heading_line(trimmed).is_some()
                || trimmed == "----"
                || list_item(trimmed, &ListKind::Unordered).is_some()
                || list_item(trimmed, &ListKind::Ordered).is_some()
            {
                break;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(trimmed);
            i += 1;
        }

        let inline = self.inline(&text);
        write!(self.output, "<p>{inline}</p>").unwrap();
        i
    }

    /// Render inline markup within a line of prose.
    fn inline(&mut self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            match c {
                '`' => match find_close(&chars, i + 1, '`') {
                    Some(end) => {
                        let code: String = chars[i + 1..end].iter().collect();
                        write!(out, "<code>{}</code>", escape_html(&code)).unwrap();
                        i = end + 1;
                    }
                    None => {
                        self.warnings.push("unmatched backtick".to_owned());
                        out.push('`');
                        i += 1;
                    }
                },
                '*' | '_' => {
                    let open_ok = i == 0 || !chars[i - 1].is_alphanumeric();
                    match find_span_close(&chars, i, c) {
                        Some(end) if open_ok => {
                            let span: String = chars[i + 1..end].iter().collect();
                            let tag = if c == '*' { "strong" } else { "em" };
                            write!(out, "<{tag}>{}</{tag}>", escape_html(&span)).unwrap();
                            i = end + 1;
                        }
                        _ => {
                            out.push_str(&escape_html(&c.to_string()));
                            i += 1;
                        }
                    }
                }
                _ => {
                    let mut buf = [0u8; 4];
                    out.push_str(&escape_html(c.encode_utf8(&mut buf)));
                    i += 1;
                }
            }
        }

        out
    }
}

/// Match `= Title` through `====== Title`, returning HTML heading level.
///
/// A document title (`= `) maps to `<h1>`, sections step down from there.
fn heading_line(line: &str) -> Option<(u8, &str)> {
    let marker_len = line.chars().take_while(|&c| c == '=').count();
    if marker_len == 0 || marker_len > 6 {
        return None;
    }
    let rest = &line[marker_len..];
    let title = rest.strip_prefix(' ')?.trim();
    if title.is_empty() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some((marker_len as u8, title))
}

fn list_item<'a>(line: &'a str, kind: &ListKind) -> Option<&'a str> {
    let prefix = match kind {
        ListKind::Unordered => "* ",
        ListKind::Ordered => ". ",
    };
    line.strip_prefix(prefix).map(str::trim)
}

/// Find the closing delimiter for inline code, anywhere on the line.
fn find_close(chars: &[char], from: usize, delim: char) -> Option<usize> {
    (from..chars.len()).find(|&j| chars[j] == delim)
}

/// Find a closing `*` or `_` that sits on a word boundary, with at least
/// one character inside the span.
fn find_span_close(chars: &[char], open: usize, delim: char) -> Option<usize> {
    (open + 2..chars.len()).find(|&j| {
        chars[j] == delim
            && chars[j - 1] != ' '
            && chars.get(j + 1).is_none_or(|next| !next.is_alphanumeric())
    })
}
