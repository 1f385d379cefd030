//! Durable key-value storage for the watchlist
//!
//! The watchlist persists its committed state as a single serialized blob
//! under one well-known key. The backing store is pluggable so tests and
//! embedders can swap in their own persistence.

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StorageError;

/// Abstraction over a durable key-value store
///
/// `get` returning `None` (or a later failure to decode the returned
/// blob) is treated by callers as the empty state, never as fatal.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads the blob stored under `key`, if any
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the blob stored under `key` in one atomic write
    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File-backed store: one JSON file per key under a directory
///
/// Writes go through a temp file followed by a rename, so readers never
/// observe a partially written blob.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created lazily
    /// on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    async fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();

        assert!(store.get("missing").await.unwrap().is_none());

        store.put("key", "value").await.unwrap();
        assert_eq!(store.get("key").await.unwrap().unwrap(), "value");

        store.put("key", "replaced").await.unwrap();
        assert_eq!(store.get("key").await.unwrap().unwrap(), "replaced");
    }

    #[tokio::test]
    async fn file_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();

        let store = FileStore::new(dir.path());
        store.put("watchlist", r#"{"a":1}"#).await.unwrap();

        let reopened = FileStore::new(dir.path());
        assert_eq!(
            reopened.get("watchlist").await.unwrap().unwrap(),
            r#"{"a":1}"#
        );
    }

    #[tokio::test]
    async fn file_store_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path());

        assert!(store.get("never_written").await.unwrap().is_none());
    }
}
