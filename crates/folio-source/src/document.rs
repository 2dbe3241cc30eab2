//! Document model and front matter parsing.
//!
//! A [`Document`] is one source content file plus its metadata. Front matter
//! is a leading `---`-fenced YAML block parsed with `serde_yaml`; files
//! without front matter get default metadata.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Lightweight markup format of a document, derived from its extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// CommonMark / GitHub Flavored Markdown (`.md`).
    Markdown,
    /// AsciiDoc (`.adoc`).
    Asciidoc,
}

impl Format {
    /// File extensions that participate in scanning and route resolution.
    pub const EXTENSIONS: [&'static str; 2] = ["md", "adoc"];

    /// Determine format from a file path's extension.
    ///
    /// Returns `None` for extensions Folio does not render.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "md" => Some(Self::Markdown),
            "adoc" => Some(Self::Asciidoc),
            _ => None,
        }
    }
}

/// Metadata parsed from a document's front matter block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrontMatter {
    /// Document title. Overrides the first heading when set.
    pub title: Option<String>,
    /// Draft flag. Draft documents are hidden unless drafts are enabled.
    pub draft: bool,
}

/// One source content file and its metadata.
///
/// Immutable once read; the source re-reads the file on every render pass,
/// so a `Document` never outlives the request that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the source root (e.g., `notes/kafka.md`).
    pub rel_path: PathBuf,
    /// URL route derived from `rel_path` (e.g., `notes/kafka`).
    pub route: String,
    /// Markup format.
    pub format: Format,
    /// Raw body text with the front matter block stripped.
    pub body: String,
    /// Parsed front matter (default when absent).
    pub meta: FrontMatter,
}

impl Document {
    /// Parse a document from raw file contents.
    ///
    /// Splits off the front matter block when present. Invalid YAML in the
    /// front matter is logged and treated as absent rather than failing the
    /// document; the fenced block is still removed from the body.
    #[must_use]
    pub fn parse(rel_path: PathBuf, format: Format, raw: &str) -> Self {
        let (front, body) = split_front_matter(raw);
        let meta = front.map_or_else(FrontMatter::default, |yaml| {
            parse_front_matter(yaml).unwrap_or_else(|err| {
                tracing::warn!(path = %rel_path.display(), error = %err, "invalid front matter, ignoring");
                FrontMatter::default()
            })
        });
        let route = route_from_rel_path(&rel_path);

        Self {
            rel_path,
            route,
            format,
            body: body.to_owned(),
            meta,
        }
    }

    /// Whether this document is flagged as a draft.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.meta.draft
    }

    /// Resolved document title.
    ///
    /// Resolution order: front matter `title` > first top-level heading in
    /// the body > humanized filename.
    #[must_use]
    pub fn title(&self) -> String {
        if let Some(title) = &self.meta.title {
            return title.clone();
        }
        if let Some(heading) = self.first_heading() {
            return heading;
        }
        title_from_filename(&self.rel_path)
    }

    /// Extract the first top-level heading from the body, per format.
    fn first_heading(&self) -> Option<String> {
        let marker = match self.format {
            Format::Markdown => "# ",
            Format::Asciidoc => "= ",
        };
        self.body
            .lines()
            .find_map(|line| line.strip_prefix(marker))
            .map(|rest| rest.trim().to_owned())
    }
}

/// Derive the URL route for a source file path.
///
/// The route is the path with its extension stripped; a trailing `index`
/// segment collapses to the parent, and a root `index.*` maps to `""`.
#[must_use]
pub fn route_from_rel_path(rel_path: &Path) -> String {
    let mut segments: Vec<String> = rel_path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    if let Some(last) = segments.last_mut() {
        if let Some(stem) = Path::new(last.as_str()).file_stem() {
            *last = stem.to_string_lossy().into_owned();
        }
        if last == "index" {
            segments.pop();
        }
    }

    segments.join("/")
}

/// Parse a front matter YAML block.
fn parse_front_matter(yaml: &str) -> Result<FrontMatter, serde_yaml::Error> {
    if yaml.trim().is_empty() {
        return Ok(FrontMatter::default());
    }
    serde_yaml::from_str(yaml)
}

/// Split raw file contents into front matter and body.
///
/// Front matter is a block delimited by `---` lines at the very start of the
/// file. Returns `(None, raw)` when no valid opening/closing fence exists.
fn split_front_matter(raw: &str) -> (Option<&str>, &str) {
    let Some(rest) = raw
        .strip_prefix("---\n")
        .or_else(|| raw.strip_prefix("---\r\n"))
    else {
        return (None, raw);
    };

    // Empty front matter: closing fence immediately follows the opening one.
    if rest == "---" {
        return (Some(""), "");
    }
    if let Some(body) = rest.strip_prefix("---\n").or_else(|| rest.strip_prefix("---\r\n")) {
        return (Some(""), body);
    }

    // Find a closing fence on its own line.
    let mut search = 0;
    while let Some(pos) = rest[search..].find("\n---") {
        let fence = search + pos;
        let after = &rest[fence + "\n---".len()..];
        let after = after.strip_prefix('\r').unwrap_or(after);
        if after.is_empty() {
            return (Some(&rest[..fence]), "");
        }
        if let Some(body) = after.strip_prefix('\n') {
            return (Some(&rest[..fence]), body);
        }
        search = fence + "\n---".len();
    }

    // Unterminated fence: not front matter, keep the whole text.
    (None, raw)
}

/// Generate a display title from a file name.
fn title_from_filename(rel_path: &Path) -> String {
    let stem = rel_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    stem.replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
