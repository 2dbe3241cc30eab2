//! Filesystem document source.
//!
//! Provides [`DocSource`] for scanning a content directory and resolving
//! URL routes to documents. All reads go straight to disk; the source keeps
//! no document state between calls.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use glob::Pattern;

use crate::document::{Document, Format};

/// Content source error.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// No document exists for the requested route.
    #[error("no document for route '{0}'")]
    NotFound(String),
    /// File contents are not valid UTF-8 text.
    #[error("not valid UTF-8 text: {}", .0.display())]
    Decode(PathBuf),
    /// Route contains invalid components (e.g., `..`).
    #[error("invalid route '{0}'")]
    InvalidRoute(String),
    /// Underlying I/O failure.
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        /// Path the operation failed on.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// File watcher could not be started.
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Filesystem content source.
///
/// Scans a root directory recursively for `.md` and `.adoc` files. Scanning
/// is restartable: every [`list`](Self::list) call walks the directory
/// afresh, so results always reflect the current tree.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use folio_source::DocSource;
///
/// let source = DocSource::new(PathBuf::from("content"));
/// for doc in source.list() {
///     println!("{} -> {}", doc.rel_path.display(), doc.route);
/// }
/// ```
pub struct DocSource {
    /// Root directory for content.
    pub(crate) root: PathBuf,
    /// Patterns for file watching (e.g., `**/*.md`).
    pub(crate) watch_patterns: Vec<Pattern>,
}

impl DocSource {
    /// Create a new source with default watch patterns (`**/*.md`, `**/*.adoc`).
    ///
    /// # Panics
    ///
    /// Panics if the built-in glob patterns fail to compile, which cannot
    /// happen for the compile-time defaults.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        let patterns = Format::EXTENSIONS
            .iter()
            .map(|ext| format!("**/*.{ext}"))
            .collect();
        Self::with_patterns(root, patterns)
    }

    /// Create a new source with custom watch patterns.
    ///
    /// # Panics
    ///
    /// Panics if any of the provided glob patterns are invalid.
    #[must_use]
    pub fn with_patterns(root: PathBuf, patterns: Vec<String>) -> Self {
        let watch_patterns = patterns
            .iter()
            .map(|p| Pattern::new(p).expect("invalid glob pattern"))
            .collect();

        Self {
            root,
            watch_patterns,
        }
    }

    /// Root content directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// List all documents under the root.
    ///
    /// Returns a lazy iterator: the directory tree is re-scanned on each
    /// call, and each document is read from disk as the iterator advances.
    /// Files that fail to read or decode are logged and skipped. Draft
    /// documents are included; filtering is the caller's concern.
    pub fn list(&self) -> impl Iterator<Item = Document> + '_ {
        let mut files = Vec::new();
        if self.root.exists() {
            self.scan_directory(&self.root, Path::new(""), &mut files);
        }

        files.into_iter().filter_map(|rel_path| {
            match self.load(&rel_path) {
                Ok(doc) => Some(doc),
                Err(err) => {
                    tracing::warn!(path = %rel_path.display(), error = %err, "skipping unreadable document");
                    None
                }
            }
        })
    }

    /// Read the document for a URL route.
    ///
    /// Candidate files are tried in order: `route.md`, `route.adoc`,
    /// `route/index.md`, `route/index.adoc`. The empty route maps to the
    /// root `index.*`.
    ///
    /// # Errors
    ///
    /// - [`SourceError::InvalidRoute`] for routes containing `..`
    /// - [`SourceError::NotFound`] when no candidate file exists
    /// - [`SourceError::Decode`] when the file is not valid UTF-8
    /// - [`SourceError::Io`] for other read failures
    pub fn read(&self, route: &str) -> Result<Document, SourceError> {
        let rel_path = self.resolve(route)?;
        self.load(&rel_path)
    }

    /// Check whether a document exists for a route.
    ///
    /// Returns `false` on invalid routes.
    #[must_use]
    pub fn exists(&self, route: &str) -> bool {
        self.resolve(route).is_ok()
    }

    /// Modification time of the document behind a route, as seconds since
    /// the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the route does not resolve or the
    /// metadata cannot be read.
    pub fn mtime(&self, route: &str) -> Result<f64, SourceError> {
        let rel_path = self.resolve(route)?;
        let full_path = self.root.join(&rel_path);
        let metadata = fs::metadata(&full_path).map_err(|source| SourceError::Io {
            path: full_path.clone(),
            source,
        })?;
        let modified = metadata.modified().map_err(|source| SourceError::Io {
            path: full_path,
            source,
        })?;
        Ok(modified
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |d| d.as_secs_f64()))
    }

    /// Resolve a route to a relative source file path.
    fn resolve(&self, route: &str) -> Result<PathBuf, SourceError> {
        validate_route(route)?;

        let stems: Vec<String> = if route.is_empty() {
            vec!["index".to_owned()]
        } else {
            vec![route.to_owned(), format!("{route}/index")]
        };

        for stem in &stems {
            for ext in Format::EXTENSIONS {
                let candidate = PathBuf::from(format!("{stem}.{ext}"));
                if self.root.join(&candidate).is_file() {
                    return Ok(candidate);
                }
            }
        }

        Err(SourceError::NotFound(route.to_owned()))
    }

    /// Read and parse a document from a relative path.
    fn load(&self, rel_path: &Path) -> Result<Document, SourceError> {
        let format = Format::from_path(rel_path)
            .ok_or_else(|| SourceError::NotFound(rel_path.display().to_string()))?;
        let full_path = self.root.join(rel_path);

        let bytes = fs::read(&full_path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => {
                SourceError::NotFound(rel_path.display().to_string())
            }
            _ => SourceError::Io {
                path: full_path.clone(),
                source,
            },
        })?;
        let raw = String::from_utf8(bytes).map_err(|_| SourceError::Decode(full_path))?;

        Ok(Document::parse(rel_path.to_path_buf(), format, &raw))
    }

    /// Scan a directory recursively, collecting relative content file paths.
    ///
    /// Entries are visited directories first, then alphabetically, so the
    /// listing order is stable across scans.
    fn scan_directory(&self, dir_path: &Path, base_path: &Path, files: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir_path) else {
            return;
        };

        let mut entries: Vec<_> = entries
            .filter_map(Result::ok)
            .map(|e| {
                let is_dir = e.file_type().is_ok_and(|t| t.is_dir());
                let name_lower = e.file_name().to_string_lossy().to_lowercase();
                (e, is_dir, name_lower)
            })
            .collect();

        entries.sort_by(|(_, a_is_dir, a_name), (_, b_is_dir, b_name)| {
            b_is_dir.cmp(a_is_dir).then_with(|| a_name.cmp(b_name))
        });

        for (entry, is_dir, name_lower) in entries {
            // Skip hidden and underscore-prefixed files/dirs
            if name_lower.starts_with('.') || name_lower.starts_with('_') {
                continue;
            }

            // Skip common non-content directories
            if is_dir
                && matches!(
                    name_lower.as_str(),
                    "node_modules" | "target" | "dist" | "build" | "vendor" | "__pycache__"
                )
            {
                continue;
            }

            let path = entry.path();
            let rel_path = base_path.join(entry.file_name());

            if is_dir {
                self.scan_directory(&path, &rel_path, files);
            } else if Format::from_path(&path).is_some() {
                files.push(rel_path);
            }
        }
    }
}

/// Validate that a route doesn't escape the content root.
///
/// Rejects routes containing parent directory segments (`..`) to prevent
/// path traversal (e.g., `../../etc/passwd`).
fn validate_route(route: &str) -> Result<(), SourceError> {
    if route.split('/').any(|segment| segment == "..") {
        return Err(SourceError::InvalidRoute(route.to_owned()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::document::FrontMatter;

    fn create_test_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }

    fn source_for(dir: &tempfile::TempDir) -> DocSource {
        DocSource::new(dir.path().to_path_buf())
    }

    #[test]
    fn test_list_empty_dir() {
        let dir = create_test_dir();
        let source = source_for(&dir);

        assert_eq!(source.list().count(), 0);
    }

    #[test]
    fn test_list_missing_dir() {
        let source = DocSource::new(PathBuf::from("/nonexistent"));

        assert_eq!(source.list().count(), 0);
    }

    #[test]
    fn test_list_flat_structure() {
        let dir = create_test_dir();
        fs::write(dir.path().join("guide.md"), "# Guide\n").unwrap();
        fs::write(dir.path().join("api.adoc"), "= API\n").unwrap();
        fs::write(dir.path().join("logo.png"), [0x89, 0x50]).unwrap();

        let source = source_for(&dir);
        let routes: Vec<_> = source.list().map(|d| d.route).collect();

        assert_eq!(routes, vec!["api", "guide"]);
    }

    #[test]
    fn test_list_nested_dirs_first() {
        let dir = create_test_dir();
        fs::create_dir(dir.path().join("notes")).unwrap();
        fs::write(dir.path().join("notes/kafka.md"), "# Kafka\n").unwrap();
        fs::write(dir.path().join("about.md"), "# About\n").unwrap();

        let source = source_for(&dir);
        let routes: Vec<_> = source.list().map(|d| d.route).collect();

        assert_eq!(routes, vec!["notes/kafka", "about"]);
    }

    #[test]
    fn test_list_skips_hidden_and_underscore() {
        let dir = create_test_dir();
        fs::write(dir.path().join(".hidden.md"), "# Hidden\n").unwrap();
        fs::write(dir.path().join("_draft.md"), "# Underscore\n").unwrap();
        fs::write(dir.path().join("visible.md"), "# Visible\n").unwrap();

        let source = source_for(&dir);
        let routes: Vec<_> = source.list().map(|d| d.route).collect();

        assert_eq!(routes, vec!["visible"]);
    }

    #[test]
    fn test_list_includes_drafts() {
        let dir = create_test_dir();
        fs::write(
            dir.path().join("secret.md"),
            "---\ndraft: true\n---\n# Secret\n",
        )
        .unwrap();

        let source = source_for(&dir);
        let docs: Vec<_> = source.list().collect();

        assert_eq!(docs.len(), 1);
        assert!(docs[0].is_draft());
    }

    #[test]
    fn test_list_rescans_on_each_call() {
        let dir = create_test_dir();
        let source = source_for(&dir);
        assert_eq!(source.list().count(), 0);

        fs::write(dir.path().join("new.md"), "# New\n").unwrap();

        assert_eq!(source.list().count(), 1);
    }

    #[test]
    fn test_read_markdown() {
        let dir = create_test_dir();
        fs::write(dir.path().join("hello.md"), "# Hi\n").unwrap();

        let source = source_for(&dir);
        let doc = source.read("hello").unwrap();

        assert_eq!(doc.format, Format::Markdown);
        assert_eq!(doc.body, "# Hi\n");
        assert_eq!(doc.meta, FrontMatter::default());
    }

    #[test]
    fn test_read_prefers_markdown_over_asciidoc() {
        let dir = create_test_dir();
        fs::write(dir.path().join("page.md"), "# Markdown\n").unwrap();
        fs::write(dir.path().join("page.adoc"), "= AsciiDoc\n").unwrap();

        let source = source_for(&dir);
        let doc = source.read("page").unwrap();

        assert_eq!(doc.format, Format::Markdown);
    }

    #[test]
    fn test_read_directory_index() {
        let dir = create_test_dir();
        fs::create_dir(dir.path().join("notes")).unwrap();
        fs::write(dir.path().join("notes/index.md"), "# Notes\n").unwrap();

        let source = source_for(&dir);
        let doc = source.read("notes").unwrap();

        assert_eq!(doc.rel_path, PathBuf::from("notes/index.md"));
        assert_eq!(doc.route, "notes");
    }

    #[test]
    fn test_read_root_index() {
        let dir = create_test_dir();
        fs::write(dir.path().join("index.md"), "# Home\n").unwrap();

        let source = source_for(&dir);
        let doc = source.read("").unwrap();

        assert_eq!(doc.route, "");
    }

    #[test]
    fn test_read_not_found() {
        let dir = create_test_dir();
        let source = source_for(&dir);

        let err = source.read("missing").unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[test]
    fn test_read_invalid_utf8_is_decode_error() {
        let dir = create_test_dir();
        fs::write(dir.path().join("binary.md"), [0xff, 0xfe, 0x00, 0x01]).unwrap();

        let source = source_for(&dir);
        let err = source.read("binary").unwrap_err();

        assert!(matches!(err, SourceError::Decode(_)));
    }

    #[test]
    fn test_read_rejects_traversal() {
        let dir = create_test_dir();
        let source = source_for(&dir);

        let err = source.read("../etc/passwd").unwrap_err();
        assert!(matches!(err, SourceError::InvalidRoute(_)));
    }

    #[test]
    fn test_exists() {
        let dir = create_test_dir();
        fs::write(dir.path().join("here.md"), "# Here\n").unwrap();

        let source = source_for(&dir);

        assert!(source.exists("here"));
        assert!(!source.exists("gone"));
        assert!(!source.exists("../escape"));
    }

    #[test]
    fn test_mtime() {
        let dir = create_test_dir();
        fs::write(dir.path().join("page.md"), "# Page\n").unwrap();

        let source = source_for(&dir);
        let mtime = source.mtime("page").unwrap();

        assert!(mtime > 0.0);
    }

    #[test]
    fn test_doc_source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DocSource>();
    }
}
