// src/services/local_state.rs
// DOCUMENTATION: Durable local key-value state
// PURPOSE: Hold the plan subscription marker and monthly AI usage counters

use crate::errors::SpotsError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// String-to-string lookups persisted on this device
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: String) -> Result<(), SpotsError>;

    async fn remove(&self, key: &str) -> Result<(), SpotsError>;
}

/// JSON file holding every key; rewritten on each change
pub struct FileStateStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStateStore {
    /// Open the file, starting empty when it does not exist yet
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, SpotsError> {
        let path = path.into();
        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                log::error!("Local state at {} is corrupt: {}", path.display(), e);
                SpotsError::StorageError(format!("corrupt local state: {}", e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                return Err(SpotsError::StorageError(format!(
                    "cannot read local state: {}",
                    e
                )))
            }
        };
        log::info!(
            "Local state loaded from {} ({} keys)",
            path.display(),
            entries.len()
        );
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    async fn persist(&self, entries: &HashMap<String, String>) -> Result<(), SpotsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    SpotsError::StorageError(format!("cannot create state dir: {}", e))
                })?;
            }
        }
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| SpotsError::StorageError(e.to_string()))?;
        tokio::fs::write(&self.path, bytes).await.map_err(|e| {
            log::error!("Writing local state failed: {}", e);
            SpotsError::StorageError(format!("cannot write local state: {}", e))
        })
    }
}

#[async_trait]
impl KeyValueStore for FileStateStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) -> Result<(), SpotsError> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SpotsError> {
        let mut entries = self.entries.write().await;
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}

/// Process-lifetime state
#[derive(Default)]
pub struct MemoryStateStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.read().await.get(key).cloned()
    }

    async fn set(&self, key: &str, value: String) -> Result<(), SpotsError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SpotsError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tokomemo-test-{}", uuid::Uuid::new_v4()))
            .join(name)
    }

    #[tokio::test]
    async fn test_file_store_survives_reopen() {
        let path = temp_path("state.json");
        let store = FileStateStore::open(&path).await.unwrap();
        assert_eq!(store.get("plan").await, None);
        store.set("plan", "supporter".into()).await.unwrap();
        store.set("ai", "3".into()).await.unwrap();
        store.remove("ai").await.unwrap();

        let reopened = FileStateStore::open(&path).await.unwrap();
        assert_eq!(reopened.get("plan").await.as_deref(), Some("supporter"));
        assert_eq!(reopened.get("ai").await, None);
    }

    #[tokio::test]
    async fn test_failed_write_leaves_memory_unchanged() {
        let path = temp_path("state.json");
        let store = FileStateStore::open(&path).await.unwrap();
        store.set("ai", "1".into()).await.unwrap();

        // Replace the state directory with a plain file so the next write fails
        let dir = path.parent().unwrap();
        tokio::fs::remove_dir_all(dir).await.unwrap();
        tokio::fs::write(dir, b"").await.unwrap();

        assert!(store.set("ai", "2".into()).await.is_err());
        assert_eq!(store.get("ai").await.as_deref(), Some("1"));
        assert!(store.remove("ai").await.is_err());
        assert_eq!(store.get("ai").await.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let path = temp_path("broken.json");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"{not json").await.unwrap();
        assert!(matches!(
            FileStateStore::open(&path).await,
            Err(SpotsError::StorageError(_))
        ));
    }
}
