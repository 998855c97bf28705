use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use orchestrator::{CredentialStore, OrchestratorError, Realm, StoreScope, UserId};

use crate::{storage_key, StoreError};

/// Version of the on-disk document layout.
pub const STORE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoreDocument {
    schema_version: u32,
    #[serde(default)]
    entries: BTreeMap<String, StoredEntry>,
}

impl Default for StoreDocument {
    fn default() -> Self {
        Self {
            schema_version: STORE_SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// [`CredentialStore`] persisted as one JSON document.
///
/// The document is held in memory and rewritten (temp file + rename) after
/// every change, so readers never observe a partial file. A single mutex
/// serialises writers within the process.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    document: Mutex<StoreDocument>,
}

impl FileCredentialStore {
    /// Opens the store at `path`, starting empty if the file does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<StoreDocument>(&raw).map_err(|source| {
                StoreError::Parse {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                StoreDocument::default()
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.clone(),
                    source,
                })
            }
        };

        if document.schema_version != STORE_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedSchema {
                path,
                expected: STORE_SCHEMA_VERSION,
                found: document.schema_version,
            });
        }

        debug!(path = %path.display(), entries = document.entries.len(), "credential store opened");
        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    async fn persist(&self, document: &StoreDocument) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(document).map_err(StoreError::Encode)?;
        write_atomic(&self.path, encoded.as_bytes()).await
    }
}

async fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StoreError> {
    let write_err = |source: std::io::Error| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };
    let parent = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent).await.map_err(write_err)?;

    let temp_name = format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("credentials"),
        std::process::id()
    );
    let temp_path = parent.join(temp_name);
    tokio::fs::write(&temp_path, content)
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&temp_path, path)
        .await
        .map_err(write_err)?;
    Ok(())
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
    ) -> Result<Option<String>, OrchestratorError> {
        let key = storage_key(scope, realm, user_id);
        let document = self.document.lock().await;
        Ok(document.entries.get(&key).map(|entry| entry.value.clone()))
    }

    async fn put(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
        value: &str,
    ) -> Result<(), OrchestratorError> {
        let key = storage_key(scope, realm, user_id);
        let mut document = self.document.lock().await;
        let previous = document.entries.insert(
            key.clone(),
            StoredEntry {
                value: value.to_string(),
                updated_at: Utc::now(),
            },
        );
        if let Err(err) = self.persist(&document).await {
            // Keep memory and disk in agreement.
            match previous {
                Some(previous) => document.entries.insert(key, previous),
                None => document.entries.remove(&key),
            };
            return Err(err.into());
        }
        Ok(())
    }

    async fn delete(
        &self,
        scope: StoreScope,
        realm: Realm,
        user_id: &UserId,
    ) -> Result<(), OrchestratorError> {
        let key = storage_key(scope, realm, user_id);
        let mut document = self.document.lock().await;
        let Some(previous) = document.entries.remove(&key) else {
            return Ok(());
        };
        if let Err(err) = self.persist(&document).await {
            document.entries.insert(key, previous);
            return Err(err.into());
        }
        Ok(())
    }
}
