//! Key-value store persisted as a single JSON document on disk.
//!
//! The whole map is rewritten on every `set`. State files are small (a few
//! selections and snapshots per identity), so there is no write batching.
//! Writes go to a sibling temp file that is then renamed over the state file.

use crate::errors::TailorError;
use crate::services::KeyValueStore;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

pub struct JsonFileStore {
    entries: RwLock<HashMap<String, Value>>,
    path: PathBuf,
}

impl JsonFileStore {
    /// Opens the store, loading existing state if the file exists.
    ///
    /// An unreadable or corrupt state file is logged and replaced by empty
    /// state on the next write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TailorError> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            log::info!("State file {:?} does not exist, starting with empty state", path);
            return Ok(Self::with_entries(path, HashMap::new()));
        }

        let entries = match Self::load(&path).await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Ignoring unreadable state file, starting with empty state: {}", e);
                HashMap::new()
            }
        };

        log::debug!("Loaded {} state entries from {:?}", entries.len(), path);
        Ok(Self::with_entries(path, entries))
    }

    fn with_entries(path: PathBuf, entries: HashMap<String, Value>) -> Self {
        Self {
            entries: RwLock::new(entries),
            path,
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, Value>, TailorError> {
        let data = tokio::fs::read(path).await.map_err(|e| {
            TailorError::storage(path.display().to_string(), format!("Failed to read state file: {}", e))
        })?;

        if data.is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_slice(&data).map_err(|e| {
            TailorError::storage(
                path.display().to_string(),
                format!("Failed to deserialize state file: {}", e),
            )
        })
    }

    async fn save(&self, entries: &HashMap<String, Value>) -> Result<(), TailorError> {
        let storage_error = |context: &str, e: &dyn std::fmt::Display| {
            TailorError::storage(self.path.display().to_string(), format!("{}: {}", context, e))
        };

        let serialized = serde_json::to_vec_pretty(entries)
            .map_err(|e| storage_error("Failed to serialize state", &e))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| storage_error("Failed to create state directory", &e))?;
            }
        }

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);

        tokio::fs::write(&temp_path, serialized)
            .await
            .map_err(|e| storage_error("Failed to write state file", &e))?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(storage_error("Failed to replace state file", &e));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, TailorError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    /// The new value only becomes visible once it is on disk.
    async fn set(&self, key: &str, value: Value) -> Result<(), TailorError> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.save(&next).await?;
        *entries = next;
        Ok(())
    }
}
