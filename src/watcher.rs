//! Filesystem change watcher that keeps the response cache coherent.
//!
//! Subscribes to the data root recursively via `notify`. The synchronous
//! notify callback forwards events into a channel; a tokio task consumes
//! them and invalidates the matching cache entry for every content write.

use crate::cache::ResponseCache;
use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Handle for the running watcher.
///
/// Owns the underlying `RecommendedWatcher`; dropping the handle releases
/// the subscription. The process normally keeps it alive until exit, but
/// tests can stop the task explicitly with [`WatcherHandle::close`].
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    shutdown: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatcherHandle {
    /// Stop the invalidation task and wait for it to finish.
    pub async fn close(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Subscribe to write events under `root` and spawn the invalidation task.
///
/// `root` must be the same canonicalized path the request handlers use to
/// build cache keys; event paths reported by the OS then match keys
/// exactly. A failed subscription is returned as an error and treated as
/// fatal by the caller: without it cache coherency cannot be guaranteed.
pub fn spawn_watcher(root: &Path, cache: ResponseCache) -> notify::Result<WatcherHandle> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

    // Called synchronously by notify; just hop into the async world.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        },
        Config::default(),
    )?;
    watcher.watch(root, RecursiveMode::Recursive)?;

    info!(root = %root.display(), "watching data directory");

    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                received = event_rx.recv() => match received {
                    Some(Ok(event)) => handle_event(&cache, &event),
                    Some(Err(err)) => {
                        // Delivery errors are recoverable; keep watching.
                        warn!(error = %err, "watch event delivery failed");
                    }
                    None => break,
                },
            }
        }
        debug!("change watcher stopped");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        shutdown: shutdown_tx,
        task,
    })
}

fn handle_event(cache: &ResponseCache, event: &Event) {
    if !is_content_write(&event.kind) {
        return;
    }
    for path in &event.paths {
        if cache.invalidate(path) {
            info!(path = %path.display(), "file modified, cache entry cleared");
        }
    }
}

/// Only content writes invalidate; renames, removals, and metadata changes
/// (chmod) leave the cache alone.
fn is_content_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use notify::event::{DataChange, MetadataKind};
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_event_kind_filter() {
        assert!(is_content_write(&EventKind::Modify(ModifyKind::Data(
            DataChange::Content
        ))));
        assert!(is_content_write(&EventKind::Modify(ModifyKind::Any)));
        assert!(!is_content_write(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::Permissions
        ))));
        assert!(!is_content_write(&EventKind::Create(
            notify::event::CreateKind::File
        )));
        assert!(!is_content_write(&EventKind::Remove(
            notify::event::RemoveKind::File
        )));
    }

    #[test]
    fn test_handle_event_invalidates_only_write_paths() {
        let cache = ResponseCache::new();
        let written = PathBuf::from("/data/written.json");
        let untouched = PathBuf::from("/data/untouched.json");
        cache.put(written.clone(), Bytes::from_static(b"old"));
        cache.put(untouched.clone(), Bytes::from_static(b"keep"));

        let event = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(written.clone());
        handle_event(&cache, &event);

        assert!(cache.get(&written).is_none());
        assert!(cache.get(&untouched).is_some());
    }

    #[test]
    fn test_handle_event_ignores_removal() {
        let cache = ResponseCache::new();
        let key = PathBuf::from("/data/a.json");
        cache.put(key.clone(), Bytes::from_static(b"v1"));

        let event = Event::new(EventKind::Remove(notify::event::RemoveKind::File))
            .add_path(key.clone());
        handle_event(&cache, &event);

        assert!(cache.get(&key).is_some());
    }

    #[tokio::test]
    async fn test_subscription_failure_on_missing_root() {
        let cache = ResponseCache::new();
        assert!(spawn_watcher(Path::new("/definitely/not/a/real/dir"), cache).is_err());
    }

    #[tokio::test]
    async fn test_write_event_clears_cached_entry() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let file = root.join("resp.json");
        std::fs::write(&file, b"v1").unwrap();

        let cache = ResponseCache::new();
        cache.put(file.clone(), Bytes::from_static(b"v1"));

        let handle = spawn_watcher(&root, cache.clone()).unwrap();
        // Give the subscription a moment to settle before writing.
        tokio::time::sleep(Duration::from_millis(200)).await;

        std::fs::write(&file, b"v2").unwrap();

        let mut cleared = false;
        for _ in 0..100 {
            if cache.get(&file).is_none() {
                cleared = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        handle.close().await;
        assert!(cleared, "write event did not invalidate the cache entry");
    }
}
