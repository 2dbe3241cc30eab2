//! Request error handling.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use folio_source::SourceError;

/// Error returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// No document resolves to the requested route.
    #[error("page not found: {0}")]
    PageNotFound(String),
    /// Reading or decoding the source document failed.
    #[error("failed to load page: {0}")]
    Source(SourceError),
}

impl From<SourceError> for ServerError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(route) | SourceError::InvalidRoute(route) => {
                Self::PageNotFound(route)
            }
            other => Self::Source(other),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::PageNotFound(route) => {
                tracing::debug!(route = %route, "Page not found");
                (StatusCode::NOT_FOUND, "Page not found".to_owned())
            }
            Self::Source(err) => {
                tracing::error!(error = %err, "Failed to load page");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
        };

        let body = format!(
            "<!DOCTYPE html>\n<html><head><title>{status}</title></head>\
             <body><h1>{status}</h1><p>{message}</p></body></html>\n"
        );
        (status, Html(body)).into_response()
    }
}
