//! Filesystem read access for response bodies.

use bytes::Bytes;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from reading a response file.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The resolved path has no file behind it; answered as 404.
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Any other read failure. Logged server-side, never shown to clients.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Thin read wrapper around the filesystem.
#[derive(Clone, Default)]
pub struct FileStore;

impl FileStore {
    pub fn new() -> Self {
        Self
    }

    /// Read the full contents of a resolved file path.
    pub async fn read(&self, path: &Path) -> Result<Bytes, StoreError> {
        match tokio::fs::read(path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_path_buf()))
            }
            Err(err) => Err(StoreError::Io {
                path: path.to_path_buf(),
                source: err,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("body.json");
        std::fs::write(&path, b"{\"id\":1}").unwrap();

        let store = FileStore::new();
        let data = store.read(&path).await.unwrap();
        assert_eq!(data, Bytes::from_static(b"{\"id\":1}"));
    }

    #[tokio::test]
    async fn test_read_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let store = FileStore::new();
        match store.read(&path).await {
            Err(StoreError::NotFound(p)) => assert_eq!(p, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let store = FileStore::new();
        assert!(matches!(
            store.read(dir.path()).await,
            Err(StoreError::Io { .. })
        ));
    }
}
