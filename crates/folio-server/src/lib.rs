//! HTTP preview server for Folio.
//!
//! Serves rendered HTML pages for a content directory using axum. Each
//! `GET /{route}` request resolves the route against the content source,
//! renders the document, and returns a complete HTML page. When file
//! watching is enabled, edits to the content directory invalidate the
//! render cache so the next request reflects them.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use folio_server::{ServerConfig, run_server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ServerConfig {
//!         host: "127.0.0.1".to_string(),
//!         port: 4000,
//!         content_dir: PathBuf::from("content"),
//!         ..ServerConfig::default()
//!     };
//!
//!     run_server(config).await.unwrap();
//! }
//! ```

mod app;
mod cache;
mod error;
mod handlers;
mod state;
mod watch;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use folio_renderer::Renderer;
use folio_source::DocSource;
use state::AppState;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Content source directory.
    pub content_dir: PathBuf,
    /// Serve documents marked as drafts.
    pub include_drafts: bool,
    /// Watch the content directory for changes.
    pub watch_enabled: bool,
    /// Watch patterns relative to the content directory.
    pub watch_patterns: Option<Vec<String>>,
    /// Enable verbose output (log render warnings).
    pub verbose: bool,
    /// Application version (for cache invalidation).
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 4000,
            content_dir: PathBuf::from("."),
            include_drafts: false,
            watch_enabled: true,
            watch_patterns: None,
            verbose: false,
            version: String::new(),
        }
    }
}

/// Server startup error.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The configured host/port does not form a valid socket address.
    #[error("invalid bind address {addr}: {source}")]
    Addr {
        /// Address string that failed to parse.
        addr: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },
    /// Binding the listener failed (address in use, permission denied).
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address that could not be bound.
        addr: SocketAddr,
        /// Underlying IO failure.
        source: std::io::Error,
    },
    /// The file watcher could not be started.
    #[error("failed to start file watcher: {0}")]
    Watch(#[from] folio_source::SourceError),
    /// The accept loop failed after startup.
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Run the server until shutdown.
///
/// Binds the configured address, then serves requests until Ctrl-C.
///
/// # Errors
///
/// Returns [`ServeError::Bind`] when the address is already in use and
/// other variants for startup failures. Never returns an error for a
/// failure to serve an individual request.
pub async fn run_server(config: ServerConfig) -> Result<(), ServeError> {
    let source = match &config.watch_patterns {
        Some(patterns) => DocSource::with_patterns(config.content_dir.clone(), patterns.clone()),
        None => DocSource::new(config.content_dir.clone()),
    };

    let state = Arc::new(AppState::new(
        Arc::new(source),
        Renderer::new(),
        config.include_drafts,
        config.watch_enabled,
        config.verbose,
        config.version.clone(),
    ));

    // The handle stops the watcher thread when run_server returns.
    let _watch_handle = if config.watch_enabled {
        Some(watch::spawn(Arc::clone(&state))?)
    } else {
        None
    };

    let router = app::create_router(Arc::clone(&state));

    let addr_str = format!("{}:{}", config.host, config.port);
    let addr = SocketAddr::from_str(&addr_str).map_err(|source| ServeError::Addr {
        addr: addr_str,
        source,
    })?;

    tracing::info!(address = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install Ctrl+C handler");
        return;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}

/// Create server configuration from a loaded Folio config.
#[must_use]
pub fn server_config_from_config(
    config: &folio_config::Config,
    version: String,
    verbose: bool,
) -> ServerConfig {
    ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        content_dir: config.content_resolved.dir.clone(),
        include_drafts: config.content_resolved.include_drafts,
        watch_enabled: config.watch.enabled,
        watch_patterns: config.watch.patterns.clone(),
        verbose,
        version,
    }
}
