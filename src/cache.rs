//! In-memory response cache keyed by resolved file path.
//!
//! Shared between the request handlers (read, insert on miss) and the
//! change watcher (targeted invalidation on write events).

use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Concurrent path -> bytes cache.
///
/// Cloning is cheap and shares the underlying map. All operations hold the
/// lock only for the map access itself; no I/O happens inside the critical
/// section. A `put` racing an `invalidate` for the same key resolves
/// last-writer-wins at the lock boundary; a stale entry left by that race
/// survives only until the next write event or the next miss.
#[derive(Clone, Default)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<PathBuf, Bytes>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached bytes for a resolved path.
    pub fn get(&self, key: &Path) -> Option<Bytes> {
        self.entries.read().get(key).cloned()
    }

    /// Insert freshly read bytes, returning a handle to the stored value.
    pub fn put(&self, key: PathBuf, data: Bytes) -> Bytes {
        self.entries.write().insert(key, data.clone());
        data
    }

    /// Drop the entry for a path. Returns false if nothing was cached,
    /// which is a no-op rather than an error.
    pub fn invalidate(&self, key: &Path) -> bool {
        self.entries.write().remove(key).is_some()
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_put_roundtrip() {
        let cache = ResponseCache::new();
        let key = PathBuf::from("/data/hello.json");

        assert!(cache.get(&key).is_none());

        cache.put(key.clone(), Bytes::from_static(b"{\"ok\":true}"));
        assert_eq!(cache.get(&key).unwrap(), Bytes::from_static(b"{\"ok\":true}"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_removes_entry() {
        let cache = ResponseCache::new();
        let key = PathBuf::from("/data/a.txt");

        cache.put(key.clone(), Bytes::from_static(b"v1"));
        assert!(cache.invalidate(&key));
        assert!(cache.get(&key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_missing_is_noop() {
        let cache = ResponseCache::new();
        assert!(!cache.invalidate(Path::new("/data/never-cached")));
    }

    #[test]
    fn test_put_overwrites() {
        let cache = ResponseCache::new();
        let key = PathBuf::from("/data/a.txt");

        cache.put(key.clone(), Bytes::from_static(b"v1"));
        cache.put(key.clone(), Bytes::from_static(b"v2"));
        assert_eq!(cache.get(&key).unwrap(), Bytes::from_static(b"v2"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_concurrent_readers_and_invalidator() {
        let cache = ResponseCache::new();
        let key = PathBuf::from("/data/hot.json");
        cache.put(key.clone(), Bytes::from_static(b"hot"));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let key = key.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    // Either the old value or absence is acceptable mid-race.
                    if let Some(v) = cache.get(&key) {
                        assert_eq!(v, Bytes::from_static(b"hot"));
                    }
                }
            }));
        }
        {
            let cache = cache.clone();
            let key = key.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..1000 {
                    cache.invalidate(&key);
                    cache.put(key.clone(), Bytes::from_static(b"hot"));
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
    }
}
