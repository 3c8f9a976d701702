//! Credential provider backed by the persistent store.
//!
//! Keys are only persisted when the user opts in to "remember"; saving without
//! it wipes whatever an earlier session stored.

use crate::config::ProfileConfig;
use crate::ride::types::Credential;
use crate::storage::{KeyValueStore, StorageError, StorageResult};

/// Loads, saves and clears the remembered credential.
#[derive(Debug)]
pub struct ProfileStore<S> {
    store: S,
    public_key_entry: String,
    private_key_entry: String,
}

impl<S: KeyValueStore> ProfileStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, &ProfileConfig::default())
    }

    pub fn with_config(store: S, config: &ProfileConfig) -> Self {
        Self {
            store,
            public_key_entry: format!("{}.publicKey", config.namespace),
            private_key_entry: format!("{}.privateKey", config.namespace),
        }
    }

    /// The remembered credential, if a public key was saved.
    pub async fn load(&self) -> StorageResult<Option<Credential>> {
        let Some(public_key) = self.store.get(&self.public_key_entry).await? else {
            return Ok(None);
        };
        if public_key.trim().is_empty() {
            return Ok(None);
        }
        let private_key = self
            .store
            .get(&self.private_key_entry)
            .await?
            .filter(|key| !key.is_empty());
        Ok(Some(Credential {
            public_key,
            private_key,
        }))
    }

    /// Persist `credential` when `remember` is set, otherwise forget any stored keys.
    pub async fn save(&self, credential: &Credential, remember: bool) -> StorageResult<()> {
        if !credential.has_public_key() {
            return Err(StorageError::Backend(
                "cannot save a profile without a public key".to_string(),
            ));
        }
        if !remember {
            return self.clear().await;
        }

        self.store
            .put(&self.public_key_entry, credential.public_key.clone())
            .await?;
        match credential.private_key() {
            Some(private_key) => {
                self.store
                    .put(&self.private_key_entry, private_key.to_string())
                    .await?
            }
            None => self.store.remove(&self.private_key_entry).await?,
        }

        tracing::info!(
            public_key = %credential.masked_public_key(),
            private_key_stored = credential.private_key().is_some(),
            "Profile saved"
        );
        Ok(())
    }

    /// Forget both keys.
    pub async fn clear(&self) -> StorageResult<()> {
        self.store.remove(&self.public_key_entry).await?;
        self.store.remove(&self.private_key_entry).await?;
        tracing::info!("Profile cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_empty_profile() {
        let profile = ProfileStore::new(MemoryStore::new());
        assert!(profile.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_remembered_round_trip() {
        let store = MemoryStore::new();
        let profile = ProfileStore::new(store.clone());
        let credential = Credential::new("pk1", Some("sk1".to_string()));

        profile.save(&credential, true).await.unwrap();
        assert_eq!(
            store.get("profile.publicKey").await.unwrap().as_deref(),
            Some("pk1")
        );
        assert_eq!(profile.load().await.unwrap(), Some(credential));
    }

    #[tokio::test]
    async fn test_public_key_only() {
        let profile = ProfileStore::new(MemoryStore::new());
        profile
            .save(&Credential::new("pk1", Some(String::new())), true)
            .await
            .unwrap();

        let loaded = profile.load().await.unwrap().unwrap();
        assert_eq!(loaded.public_key, "pk1");
        assert!(loaded.private_key.is_none());
    }

    #[tokio::test]
    async fn test_save_without_remember_forgets() {
        let profile = ProfileStore::new(MemoryStore::new());
        let credential = Credential::new("pk1", Some("sk1".to_string()));
        profile.save(&credential, true).await.unwrap();

        profile.save(&credential, false).await.unwrap();
        assert!(profile.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dropping_private_key_removes_it() {
        let store = MemoryStore::new();
        let profile = ProfileStore::new(store.clone());
        profile
            .save(&Credential::new("pk1", Some("sk1".to_string())), true)
            .await
            .unwrap();
        profile
            .save(&Credential::new("pk1", None), true)
            .await
            .unwrap();

        assert!(store.get("profile.privateKey").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let store = MemoryStore::new();
        let profile = ProfileStore::new(store.clone());
        profile
            .save(&Credential::new("pk1", Some("sk1".to_string())), true)
            .await
            .unwrap();

        profile.clear().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_empty_public_key() {
        let profile = ProfileStore::new(MemoryStore::new());
        assert!(profile.save(&Credential::default(), true).await.is_err());
    }
}
