use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use orchestrator::{CredentialStore, OrchestratorError, Realm, StoreScope, UserId};

use crate::storage_key;

/// Process-local [`CredentialStore`].
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
    ) -> Result<Option<String>, OrchestratorError> {
        let key = storage_key(scope, realm, user_id);
        Ok(self.entries.read().await.get(&key).cloned())
    }

    async fn put(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
        value: &str,
    ) -> Result<(), OrchestratorError> {
        let key = storage_key(scope, realm, user_id);
        self.entries.write().await.insert(key, value.to_string());
        Ok(())
    }

    async fn delete(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
    ) -> Result<(), OrchestratorError> {
        let key = storage_key(scope, realm, user_id);
        self.entries.write().await.remove(&key);
        Ok(())
    }
}
