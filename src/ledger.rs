//! Bounded, per-identity history of submission outcomes.
//!
//! # Layout
//! Each public key owns one partition stored under `<namespace>.<publicKey>` as a
//! JSON array of `TransactionRecord`, newest first. Partitions are independent.
//!
//! # Invariants
//! - A partition never holds more than `capacity` records
//! - Insertion order is authoritative; timestamps are never used to reorder
//! - Appends to one partition are serialised across the whole
//!   read-modify-truncate-write sequence

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::config::LedgerConfig;
use crate::observability::metrics;
use crate::ride::types::{mask_key, TransactionRecord};
use crate::storage::{KeyValueStore, StorageResult};

/// Default number of records kept per public key.
pub const DEFAULT_CAPACITY: usize = 10;

/// Transaction ledger over an injected key-value store.
pub struct Ledger<S> {
    store: S,
    namespace: String,
    capacity: usize,
    partition_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<S: KeyValueStore> Ledger<S> {
    /// Create a ledger with the default namespace and capacity.
    pub fn new(store: S) -> Self {
        Self::with_config(store, &LedgerConfig::default())
    }

    /// Create a ledger from configuration.
    pub fn with_config(store: S, config: &LedgerConfig) -> Self {
        Self {
            store,
            namespace: config.namespace.clone(),
            capacity: config.capacity.max(1),
            partition_locks: DashMap::new(),
        }
    }

    /// Maximum records per partition.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn partition_key(&self, public_key: &str) -> String {
        format!("{}.{}", self.namespace, public_key)
    }

    fn partition_lock(&self, public_key: &str) -> Arc<Mutex<()>> {
        self.partition_locks
            .entry(public_key.to_string())
            .or_default()
            .clone()
    }

    /// Prepend `record` to the partition for `public_key` and persist the
    /// partition truncated to capacity.
    ///
    /// Returns the partition as written.
    pub async fn append(
        &self,
        public_key: &str,
        record: TransactionRecord,
    ) -> StorageResult<Vec<TransactionRecord>> {
        let lock = self.partition_lock(public_key);
        let written = {
            let _guard = lock.lock().await;
            self.prepend(public_key, record).await
        };
        drop(lock);
        // Drop the lock entry once no other append holds or awaits it.
        self.partition_locks
            .remove_if(public_key, |_, lock| Arc::strong_count(lock) == 1);
        let records = written?;

        metrics::record_ledger_append();
        tracing::debug!(
            public_key = %mask_key(public_key),
            len = records.len(),
            "Ledger partition updated"
        );

        Ok(records)
    }

    async fn prepend(
        &self,
        public_key: &str,
        record: TransactionRecord,
    ) -> StorageResult<Vec<TransactionRecord>> {
        let mut records = Vec::with_capacity(self.capacity);
        records.push(record);
        records.extend(self.load(public_key).await?);
        records.truncate(self.capacity);

        let encoded = serde_json::to_string(&records)?;
        self.store
            .put(&self.partition_key(public_key), encoded)
            .await?;
        Ok(records)
    }

    /// Read the partition for `public_key`, newest first.
    ///
    /// Missing or unreadable partitions read as empty history.
    pub async fn read(&self, public_key: &str) -> Vec<TransactionRecord> {
        match self.load(public_key).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(
                    public_key = %mask_key(public_key),
                    error = %e,
                    "Ledger partition unavailable, treating as empty"
                );
                Vec::new()
            }
        }
    }

    /// Storage failures propagate; malformed payloads read as empty.
    async fn load(&self, public_key: &str) -> StorageResult<Vec<TransactionRecord>> {
        let Some(raw) = self.store.get(&self.partition_key(public_key)).await? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Vec<TransactionRecord>>(&raw) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!(
                    public_key = %mask_key(public_key),
                    error = %e,
                    "Failed to parse transaction history"
                );
                Ok(Vec::new())
            }
        }
    }
}

impl<S> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("namespace", &self.namespace)
            .field("capacity", &self.capacity)
            .finish()
    }
}
