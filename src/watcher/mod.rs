//! File watching for rebuild-on-save.
//!
//! Uses notify crate for cross-platform file system events.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};

/// Watches a content tree and emits debounced change notifications.
pub struct ContentWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    watch_root: PathBuf,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl ContentWatcher {
    /// Create a recursive watcher for the content root.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or the root cannot
    /// be watched.
    pub fn new(root: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Canonicalize so event paths from the OS (which are always absolute
        // and canonical) match our stored root.
        let watch_root = root
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| root.as_ref().to_path_buf());

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&watch_root, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            watch_root,
            debounce,
            pending_since: None,
        })
    }

    /// The canonical root being watched.
    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    /// Returns true once a debounced content change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut saw_relevant_event = false;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if is_relevant(&ev) => {
                    saw_relevant_event = true;
                }
                Ok(ev) => {
                    tracing::trace!(kind = ?ev.kind, paths = ?ev.paths, "ignoring event");
                }
                Err(err) => {
                    tracing::warn!(%err, "watch error");
                }
            }
        }

        if saw_relevant_event {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }
}

/// Markdown files matter; so do directory-level events, which many backends
/// report instead of the file itself.
fn is_relevant(event: &Event) -> bool {
    if event.paths.is_empty() {
        return true;
    }
    event.paths.iter().any(|path| {
        crate::document::is_markdown_file(path) || path.extension().is_none()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::EventKind;
    use tempfile::tempdir;

    fn event_for(paths: Vec<PathBuf>) -> Event {
        Event {
            kind: EventKind::Any,
            paths,
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_markdown_change_is_relevant() {
        let event = event_for(vec![PathBuf::from("/site/content/post.md")]);
        assert!(is_relevant(&event));
    }

    #[test]
    fn test_directory_level_event_is_relevant() {
        let event = event_for(vec![PathBuf::from("/site/content/posts")]);
        assert!(is_relevant(&event));
    }

    #[test]
    fn test_editor_artifacts_are_ignored() {
        let event = event_for(vec![PathBuf::from("/site/content/.post.md.swp")]);
        assert!(!is_relevant(&event));
    }

    #[test]
    fn test_real_file_modification_detected() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let path = canonical_dir.join("watched.md");
        std::fs::write(&path, "# original").expect("write");

        let mut watcher =
            ContentWatcher::new(&canonical_dir, Duration::from_millis(50)).expect("watcher");

        // Give the backend time to register the watch
        std::thread::sleep(Duration::from_millis(500));

        std::fs::write(&path, "# modified").expect("write");

        // Poll until the change is ready or timeout after 5 seconds
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        assert!(
            detected,
            "watcher should detect a markdown modification within 5 seconds"
        );
    }

    #[test]
    fn test_nested_file_detected_with_recursive_watch() {
        let dir = tempdir().expect("tempdir");
        let canonical_dir = dir.path().canonicalize().expect("canonicalize");
        let nested = canonical_dir.join("posts");
        std::fs::create_dir_all(&nested).expect("mkdir");

        let mut watcher =
            ContentWatcher::new(&canonical_dir, Duration::from_millis(50)).expect("watcher");
        std::thread::sleep(Duration::from_millis(500));

        std::fs::write(nested.join("new.md"), "# hi").expect("write");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        assert!(detected, "recursive watch should see nested writes");
    }
}
