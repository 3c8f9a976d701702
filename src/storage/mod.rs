//! Persistent key-value storage.
//!
//! The ledger and the profile store never reach for ambient globals: they are
//! handed a `KeyValueStore` and read/write string values through it.
//!
//! # Backends
//! - `MemoryStore`: in-process map, used in tests and ephemeral sessions
//! - `FileStore`: single JSON document on disk, rewritten on every `put`

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileStore;
pub use memory::MemoryStore;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be encoded or decoded.
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// String-keyed persistence substrate.
///
/// Implementations must be `Send + Sync` so a single store can be shared by the
/// ledger and the profile store across tasks.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn put(&self, key: &str, value: String) -> StorageResult<()>;

    /// Delete `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: String) -> StorageResult<()> {
        (**self).put(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key).await
    }
}
