//! Filesystem content source for the Folio preview server.
//!
//! Provides [`DocSource`] for scanning a directory tree of Markdown and
//! AsciiDoc files, resolving URL routes to source documents, and watching
//! the tree for changes.
//!
//! # Route Convention
//!
//! All route parameters are **URL routes**, not file paths:
//! - `""` - root (maps to `index.md` / `index.adoc`)
//! - `"guide"` - standalone page (`guide.md`, `guide.adoc`, or `guide/index.*`)
//! - `"notes/kafka"` - nested page
//!
//! [`DocSource`] handles the mapping from routes to files on disk.

mod document;
mod source;
mod watch;

pub use document::{Document, Format, FrontMatter, route_from_rel_path};
pub use source::{DocSource, SourceError};
pub use watch::{SourceEvent, SourceEventKind, SourceEventReceiver, WatchHandle};
