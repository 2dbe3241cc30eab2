//! Content change observation.
//!
//! Bridges the source watcher to the render cache: every debounced file
//! event advances the content generation and drops cached pages, so the
//! next request re-renders from disk.

use std::sync::Arc;

use folio_source::{SourceError, WatchHandle};

use crate::state::AppState;

/// Start watching the content directory.
///
/// Spawns a blocking task that drains source events for the lifetime of
/// the returned handle. Dropping the handle stops the watcher and ends
/// the task.
pub(crate) fn spawn(state: Arc<AppState>) -> Result<WatchHandle, SourceError> {
    let (events, handle) = state.source.watch()?;

    tokio::task::spawn_blocking(move || {
        while let Some(event) = events.recv() {
            let generation = state.bump_generation();
            state.cache.clear();
            tracing::debug!(
                path = %event.path.display(),
                kind = ?event.kind,
                generation,
                "Content changed"
            );
        }
    });

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::{Duration, Instant};

    use folio_renderer::Renderer;
    use folio_source::DocSource;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_change_advances_generation() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("hello.md"), "# Hi\n").unwrap();

        let state = Arc::new(AppState::new(
            Arc::new(DocSource::new(dir.path().to_path_buf())),
            Renderer::new(),
            false,
            true,
            false,
            String::new(),
        ));

        let handle = spawn(Arc::clone(&state)).unwrap();
        // Let the watcher register before touching the file.
        tokio::time::sleep(Duration::from_millis(200)).await;

        std::fs::write(dir.path().join("hello.md"), "# Changed\n").unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        while state.generation() == 0 && Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert!(state.generation() > 0, "watcher never observed the edit");
        handle.stop();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_spawn_fails_for_missing_directory() {
        let state = Arc::new(AppState::new(
            Arc::new(DocSource::new(PathBuf::from("/no/such/directory"))),
            Renderer::new(),
            false,
            true,
            false,
            String::new(),
        ));

        assert!(spawn(state).is_err());
    }
}
