//! Page serving endpoint.
//!
//! Resolves the request path against the content source, renders the
//! document, and returns a complete HTML page. Rendered pages are cached
//! per content generation and validated with an `ETag`.

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use chrono::{DateTime, Utc};
use folio_renderer::IndexEntry;
use md5::{Digest, Md5};

use crate::cache::CachedPage;
use crate::error::ServerError;
use crate::state::AppState;

/// Handle GET / (root page).
///
/// Serves the root `index.*` document when one exists, otherwise a
/// generated listing of all servable documents.
pub(crate) async fn get_root_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    get_page_impl(String::new(), state, headers)
}

/// Handle GET /{path}.
pub(crate) async fn get_page(
    Path(path): Path<String>,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    get_page_impl(path, state, headers)
}

/// Shared implementation for page rendering.
#[allow(clippy::needless_pass_by_value)]
fn get_page_impl(
    route: String,
    state: Arc<AppState>,
    headers: HeaderMap,
) -> Result<Response, ServerError> {
    let generation = state.generation();

    // Without a watcher nothing invalidates cache entries, so every
    // request renders straight from disk.
    let cached = if state.watch_enabled {
        match state.cache.get(&route, generation) {
            Some(cached) => cached,
            None => {
                let cached = build_page(&route, generation, &state)?;
                state.cache.insert(route.clone(), cached.clone());
                cached
            }
        }
    } else {
        build_page(&route, generation, &state)?
    };

    // Conditional request support
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && if_none_match.as_bytes() == cached.etag.as_bytes()
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let mut response_headers = HeaderMap::new();
    if let Ok(value) = cached.etag.parse() {
        response_headers.insert(header::ETAG, value);
    }
    if let Ok(value) = "no-cache".parse() {
        response_headers.insert(header::CACHE_CONTROL, value);
    }
    if let Some(last_modified) = last_modified(&route, &state)
        && let Ok(value) = last_modified.parse()
    {
        response_headers.insert(header::LAST_MODIFIED, value);
    }

    Ok((response_headers, Html(cached.html)).into_response())
}

/// Render a route into a cacheable page with its `ETag`.
fn build_page(
    route: &str,
    generation: u64,
    state: &AppState,
) -> Result<CachedPage, ServerError> {
    let html = render_route(route, state)?;
    let etag = compute_etag(&state.version, &html);
    Ok(CachedPage {
        generation,
        html,
        etag,
    })
}

/// Render the document for a route, or the listing page for a bare root.
fn render_route(route: &str, state: &AppState) -> Result<String, ServerError> {
    if route.is_empty() && !state.source.exists("") {
        return Ok(listing_page(state));
    }

    let doc = state.source.read(route)?;
    if doc.is_draft() && !state.include_drafts {
        return Err(ServerError::PageNotFound(route.to_owned()));
    }

    let page = state.renderer.render(&doc);
    if state.verbose {
        for warning in &page.warnings {
            tracing::warn!(route = %route, warning = %warning, "Page render warning");
        }
    }

    Ok(page.html)
}

/// Build the generated listing used when the root has no `index.*`.
fn listing_page(state: &AppState) -> String {
    let entries: Vec<IndexEntry> = state
        .source
        .list()
        .filter(|doc| state.include_drafts || !doc.is_draft())
        .map(|doc| IndexEntry {
            route: doc.route.clone(),
            title: doc.title(),
        })
        .collect();

    state.renderer.render_listing("Contents", &entries).html
}

/// Format the source document's mtime as an HTTP date.
fn last_modified(route: &str, state: &AppState) -> Option<String> {
    let mtime = state.source.mtime(route).ok()?;
    let timestamp = UNIX_EPOCH + Duration::from_secs_f64(mtime);
    let datetime: DateTime<Utc> = timestamp.into();
    Some(datetime.format("%a, %d %b %Y %H:%M:%S GMT").to_string())
}

/// Compute `ETag` from version and content.
///
/// Uses MD5 hash truncated to 64 bits (16 hex chars) - sufficient for
/// cache invalidation with negligible collision probability.
fn compute_etag(version: &str, content: &str) -> String {
    let hash = Md5::digest(format!("{version}:{content}").as_bytes());
    format!("\"{}\"", &hex::encode(hash)[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_etag_includes_version() {
        let etag1 = compute_etag("1.0.0", "content");
        let etag2 = compute_etag("1.0.1", "content");

        assert_ne!(etag1, etag2);
    }

    #[test]
    fn test_compute_etag_includes_content() {
        let etag1 = compute_etag("1.0.0", "content1");
        let etag2 = compute_etag("1.0.0", "content2");

        assert_ne!(etag1, etag2);
    }

    #[test]
    fn test_compute_etag_format() {
        let etag = compute_etag("1.0.0", "content");

        assert!(etag.starts_with('"'));
        assert!(etag.ends_with('"'));
        // 16 hex chars + 2 quotes = 18 total
        assert_eq!(etag.len(), 18);
    }
}
