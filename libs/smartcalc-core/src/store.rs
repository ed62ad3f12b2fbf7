//! Key-value persistence for settings and history
//!
//! Values are opaque strings, the way a browser's local storage holds them.
//! `MemoryStore` keeps them in memory; `JsonFileStore` mirrors them into a
//! single JSON object file.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{CalcError, Result};

/// Key-value store trait for persisted settings
pub trait KeyValueStore: Send + Sync {
    /// Get the value for a key
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Set the value for a key
    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send;

    /// Delete a key
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// In-memory store for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let key = key.to_string();
        async move {
            let data = self.data.read().await;
            Ok(data.get(&key).cloned())
        }
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send {
        let key = key.to_string();
        let value = value.to_string();
        async move {
            let mut data = self.data.write().await;
            data.insert(key, value);
            Ok(())
        }
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        let key = key.to_string();
        async move {
            let mut data = self.data.write().await;
            data.remove(&key);
            Ok(())
        }
    }
}

/// Store backed by one JSON object file
///
/// The whole object is rewritten on every change through a temporary file
/// and a rename, so readers never see a partial file.
pub struct JsonFileStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`; a missing file is an empty store
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                CalcError::store(format!("Invalid state file {}: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(CalcError::store(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            },
        };
        info!(path = %path.display(), keys = data.len(), "state file opened");
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, data: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_string_pretty(data)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), keys = data.len(), "state file written");
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send {
        let key = key.to_string();
        async move {
            let data = self.data.read().await;
            Ok(data.get(&key).cloned())
        }
    }

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<()>> + Send {
        let key = key.to_string();
        let value = value.to_string();
        async move {
            let mut data = self.data.write().await;
            data.insert(key, value);
            self.flush(&data).await
        }
    }

    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send {
        let key = key.to_string();
        async move {
            let mut data = self.data.write().await;
            if data.remove(&key).is_some() {
                self.flush(&data).await?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryStore::new();

        assert!(store.get("theme").await.unwrap().is_none());
        store.set("theme", "dark").await.unwrap();
        assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));
        store.delete("theme").await.unwrap();
        assert!(store.get("theme").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("state.json"))
            .await
            .unwrap();
        assert!(store.get("history").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        {
            let store = JsonFileStore::open(&path).await.unwrap();
            store.set("historyLimit", "25").await.unwrap();
            store.set("theme", "light").await.unwrap();
            store.delete("theme").await.unwrap();
        }

        let store = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(
            store.get("historyLimit").await.unwrap().as_deref(),
            Some("25")
        );
        assert!(store.get("theme").await.unwrap().is_none());
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = JsonFileStore::open(&path).await;
        assert!(matches!(result, Err(CalcError::Store(_))));
    }
}
