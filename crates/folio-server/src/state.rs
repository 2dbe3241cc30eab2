//! Application state.
//!
//! Shared state for all request handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use folio_renderer::Renderer;
use folio_source::DocSource;

use crate::cache::RenderCache;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Content source for reading documents.
    pub(crate) source: Arc<DocSource>,
    /// Renderer for converting documents to HTML.
    pub(crate) renderer: Renderer,
    /// Cache of rendered pages, keyed by route and generation.
    pub(crate) cache: RenderCache,
    /// Content generation, bumped on every observed file change.
    generation: AtomicU64,
    /// Serve documents marked as drafts.
    pub(crate) include_drafts: bool,
    /// Whether a watcher invalidates the cache. Without one, pages are
    /// always re-rendered from disk.
    pub(crate) watch_enabled: bool,
    /// Enable verbose output (log render warnings).
    pub(crate) verbose: bool,
    /// Application version for cache invalidation.
    pub(crate) version: String,
}

impl AppState {
    pub(crate) fn new(
        source: Arc<DocSource>,
        renderer: Renderer,
        include_drafts: bool,
        watch_enabled: bool,
        verbose: bool,
        version: String,
    ) -> Self {
        Self {
            source,
            renderer,
            cache: RenderCache::new(),
            generation: AtomicU64::new(0),
            include_drafts,
            watch_enabled,
            verbose,
            version,
        }
    }

    /// Current content generation.
    ///
    /// A page rendered at generation N may be served while the watcher
    /// moves to N+1; the next request observes the new generation and
    /// re-renders.
    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Advance the generation, returning the new value.
    pub(crate) fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }
}
