//! In-memory key-value store.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

use crate::storage::{KeyValueStore, StorageResult};

/// A thread-safe, non-durable store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.inner.get(key).map(|r| r.value().clone()))
    }

    async fn put(&self, key: &str, value: String) -> StorageResult<()> {
        self.inner.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key);
        Ok(())
    }
}
