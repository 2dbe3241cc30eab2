//! In-memory render cache.
//!
//! Caches complete HTML pages keyed by route. Each entry records the
//! content generation it was rendered at; a lookup against a newer
//! generation misses, so edits observed by the watcher take effect on
//! the next request without locking renders against the watcher.

use std::collections::HashMap;
use std::sync::Mutex;

/// A cached rendered page.
#[derive(Clone, Debug)]
pub(crate) struct CachedPage {
    /// Generation the page was rendered at.
    pub(crate) generation: u64,
    /// Complete HTML page.
    pub(crate) html: String,
    /// Precomputed `ETag` for conditional requests.
    pub(crate) etag: String,
}

/// Route-keyed page cache.
pub(crate) struct RenderCache {
    entries: Mutex<HashMap<String, CachedPage>>,
}

impl RenderCache {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a page, treating entries from older generations as misses.
    pub(crate) fn get(&self, route: &str, generation: u64) -> Option<CachedPage> {
        let entries = self.entries.lock().ok()?;
        entries
            .get(route)
            .filter(|page| page.generation == generation)
            .cloned()
    }

    /// Store a page, replacing any older entry for the route.
    pub(crate) fn insert(&self, route: String, page: CachedPage) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(route, page);
        }
    }

    /// Drop all cached pages.
    pub(crate) fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}
