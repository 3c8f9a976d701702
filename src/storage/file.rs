//! JSON-file backed key-value store.
//!
//! The whole key space is one JSON object on disk. Every mutation rewrites the
//! file through a temporary sibling followed by a rename, so a crash mid-write
//! leaves the previous document intact.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// Durable store persisted as a single JSON document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, loading existing contents if the file exists.
    ///
    /// A file that is not a JSON object of strings is rejected rather than
    /// silently overwritten.
    pub async fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(e)),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened file store");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, entries: &BTreeMap<String, String>) -> StorageResult<()> {
        let encoded = serde_json::to_vec_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, encoded).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> StorageResult<()> {
        let mut entries = self.entries.lock().await;
        let previous = entries.insert(key.to_string(), value);
        if let Err(e) = self.flush(&entries).await {
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().await;
        let Some(previous) = entries.remove(key) else {
            return Ok(());
        };
        if let Err(e) = self.flush(&entries).await {
            entries.insert(key.to_string(), previous);
            return Err(e);
        }
        Ok(())
    }
}
