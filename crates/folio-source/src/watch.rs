//! Change notification for the content directory.
//!
//! Provides [`DocSource::watch`] plus the event types delivered to
//! subscribers. Raw filesystem events are coalesced per path with a short
//! debounce window, since editors commonly emit several events per save.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, mpsc};
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};

use crate::source::{DocSource, SourceError};

/// Debounce window for coalescing filesystem events.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// Poll interval for the drain loop.
const DRAIN_INTERVAL: Duration = Duration::from_millis(50);

/// Kind of source change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceEventKind {
    /// Document was created.
    Created,
    /// Document was modified.
    Modified,
    /// Document was removed.
    Removed,
}

/// A content change event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceEvent {
    /// Path relative to the content root (e.g., `notes/kafka.md`).
    pub path: PathBuf,
    /// Kind of change.
    pub kind: SourceEventKind,
}

/// Receiver for source events.
///
/// Wraps a [`std::sync::mpsc::Receiver`] for synchronous delivery.
pub struct SourceEventReceiver {
    rx: mpsc::Receiver<SourceEvent>,
}

impl SourceEventReceiver {
    /// Wait for the next event (blocking).
    ///
    /// Returns `None` when the sender is dropped.
    #[must_use]
    pub fn recv(&self) -> Option<SourceEvent> {
        self.rx.recv().ok()
    }

    /// Try to receive an event without blocking.
    #[must_use]
    pub fn try_recv(&self) -> Option<SourceEvent> {
        self.rx.try_recv().ok()
    }

    /// Returns a blocking iterator over events.
    ///
    /// Stops when the sender is dropped.
    pub fn iter(&self) -> impl Iterator<Item = SourceEvent> + '_ {
        self.rx.iter()
    }
}

/// Handle to stop watching for changes.
///
/// RAII: dropping the handle stops the watch thread.
pub struct WatchHandle {
    _shutdown: Option<mpsc::Sender<()>>,
}

impl WatchHandle {
    /// Stop watching immediately (consumes the handle).
    pub fn stop(mut self) {
        self._shutdown.take();
    }
}

/// Pending event waiting for its debounce deadline.
struct PendingEvent {
    kind: SourceEventKind,
    deadline: Instant,
}

/// Thread-safe event debouncer, coalescing events per path.
struct EventDebouncer {
    pending: Mutex<HashMap<PathBuf, PendingEvent>>,
}

impl EventDebouncer {
    fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Record an event. Callable from the watcher callback thread.
    fn record(&self, path: PathBuf, kind: SourceEventKind) {
        use std::collections::hash_map::Entry;

        let mut pending = self.pending.lock().unwrap();
        let deadline = Instant::now() + DEBOUNCE;

        match pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(PendingEvent { kind, deadline });
            }
            Entry::Occupied(mut entry) => {
                if let Some(kind) = Self::coalesce(entry.get().kind, kind) {
                    entry.get_mut().kind = kind;
                    entry.get_mut().deadline = deadline;
                } else {
                    // Created then removed: the file never existed for us.
                    entry.remove();
                }
            }
        }
    }

    /// Coalesce two event kinds for the same path.
    #[allow(clippy::match_same_arms)]
    fn coalesce(existing: SourceEventKind, new: SourceEventKind) -> Option<SourceEventKind> {
        use SourceEventKind::{Created, Modified, Removed};

        match (existing, new) {
            (Created, Created | Modified) => Some(Created),
            (Created, Removed) => None,
            (Modified, Created) => Some(Created),
            (Modified, Modified) => Some(Modified),
            (Modified | Removed, Removed) => Some(Removed),
            (Removed, Created) => Some(Modified),
            (Removed, Modified) => Some(Removed),
        }
    }

    /// Drain events whose debounce deadline has passed.
    fn drain_ready(&self) -> Vec<SourceEvent> {
        let mut pending = self.pending.lock().unwrap();
        let now = Instant::now();

        let ready: Vec<PathBuf> = pending
            .iter()
            .filter(|(_, event)| event.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        ready
            .into_iter()
            .filter_map(|path| {
                let event = pending.remove(&path)?;
                Some(SourceEvent {
                    path,
                    kind: event.kind,
                })
            })
            .collect()
    }
}

impl DocSource {
    /// Start watching the content directory for changes.
    ///
    /// Returns a receiver for debounced events (paths relative to the
    /// content root) and a handle that stops watching when dropped. Only
    /// paths matching the source's watch patterns are reported.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Watch`] if the filesystem watcher cannot be
    /// created or attached to the root directory.
    pub fn watch(&self) -> Result<(SourceEventReceiver, WatchHandle), SourceError> {
        let (event_tx, event_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel();

        let debouncer = Arc::new(EventDebouncer::new());
        let root = self.root.clone();
        let patterns = self.watch_patterns.clone();
        let debouncer_for_watcher = Arc::clone(&debouncer);

        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                let Ok(event) = res else { return };
                let kind = match event.kind {
                    notify::EventKind::Create(_) => SourceEventKind::Created,
                    notify::EventKind::Modify(_) => SourceEventKind::Modified,
                    notify::EventKind::Remove(_) => SourceEventKind::Removed,
                    _ => return,
                };

                for path in event.paths {
                    let Ok(rel_path) = path.strip_prefix(&root) else {
                        continue;
                    };

                    let matches = patterns.is_empty()
                        || patterns.iter().any(|pattern| pattern.matches_path(rel_path));
                    if !matches {
                        continue;
                    }

                    debouncer_for_watcher.record(rel_path.to_path_buf(), kind);
                }
            })?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        // Drain thread: owns the watcher, exits on shutdown or when the
        // receiver goes away.
        std::thread::spawn(move || {
            let _watcher_guard = watcher;

            loop {
                match shutdown_rx.recv_timeout(DRAIN_INTERVAL) {
                    Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
                    Err(mpsc::RecvTimeoutError::Timeout) => {}
                }

                for event in debouncer.drain_ready() {
                    if event_tx.send(event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((
            SourceEventReceiver { rx: event_rx },
            WatchHandle {
                _shutdown: Some(shutdown_tx),
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::thread;

    use super::*;

    #[test]
    fn test_coalesce_matrix() {
        use SourceEventKind::{Created, Modified, Removed};

        assert_eq!(EventDebouncer::coalesce(Created, Created), Some(Created));
        assert_eq!(EventDebouncer::coalesce(Created, Modified), Some(Created));
        assert_eq!(EventDebouncer::coalesce(Created, Removed), None);
        assert_eq!(EventDebouncer::coalesce(Modified, Created), Some(Created));
        assert_eq!(EventDebouncer::coalesce(Modified, Modified), Some(Modified));
        assert_eq!(EventDebouncer::coalesce(Modified, Removed), Some(Removed));
        assert_eq!(EventDebouncer::coalesce(Removed, Created), Some(Modified));
        assert_eq!(EventDebouncer::coalesce(Removed, Modified), Some(Removed));
        assert_eq!(EventDebouncer::coalesce(Removed, Removed), Some(Removed));
    }

    #[test]
    fn test_debouncer_holds_until_deadline() {
        let debouncer = EventDebouncer::new();
        debouncer.record(PathBuf::from("a.md"), SourceEventKind::Modified);

        assert!(debouncer.drain_ready().is_empty());

        thread::sleep(DEBOUNCE + Duration::from_millis(20));

        let events = debouncer.drain_ready();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SourceEventKind::Modified);
        assert!(debouncer.drain_ready().is_empty());
    }

    #[test]
    fn test_debouncer_paths_independent() {
        let debouncer = EventDebouncer::new();
        debouncer.record(PathBuf::from("a.md"), SourceEventKind::Modified);
        debouncer.record(PathBuf::from("b.md"), SourceEventKind::Created);

        thread::sleep(DEBOUNCE + Duration::from_millis(20));

        assert_eq!(debouncer.drain_ready().len(), 2);
    }

    #[test]
    fn test_watch_reports_change() {
        let dir = tempfile::tempdir().unwrap();
        let source = DocSource::new(dir.path().to_path_buf());
        let (rx, handle) = source.watch().unwrap();

        fs::write(dir.path().join("page.md"), "# Page\n").unwrap();

        // Debounce plus drain interval plus platform watcher latency.
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut received = None;
        while Instant::now() < deadline {
            if let Some(event) = rx.try_recv() {
                received = Some(event);
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }

        let event = received.expect("no event within timeout");
        assert_eq!(event.path, PathBuf::from("page.md"));
        handle.stop();
    }

    #[test]
    fn test_watch_ignores_non_content_files() {
        let dir = tempfile::tempdir().unwrap();
        let source = DocSource::new(dir.path().to_path_buf());
        let (rx, _handle) = source.watch().unwrap();

        fs::write(dir.path().join("image.png"), [0x89]).unwrap();

        thread::sleep(DEBOUNCE + Duration::from_millis(200));
        assert!(rx.try_recv().is_none());
    }

    #[test]
    fn test_watch_handle_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<WatchHandle>();
        assert_send::<SourceEventReceiver>();
    }
}
