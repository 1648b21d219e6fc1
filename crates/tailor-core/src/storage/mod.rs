//! Typed persistence for selection state.
//!
//! The host offers an untyped key-value store. Everything the coordinator
//! keeps there goes through `CustomizationStateStore`, which fixes the set of
//! keys (`StateKey`) and wraps every value in a versioned envelope so a shape
//! change is detected instead of silently misread. Selections and snapshots
//! are maps keyed by identity and are never shared between identities.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::InMemoryStore;

use crate::core_types::Customization;
use crate::errors::TailorError;
use crate::services::KeyValueStore;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    SelectionByIdentity,
    SnapshotByIdentity,
    OverrideMarker,
    NewCount,
}

impl StateKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::SelectionByIdentity => "customizations.selected",
            StateKey::SnapshotByIdentity => "customizations.persisted",
            StateKey::OverrideMarker => "customizations.override",
            StateKey::NewCount => "customizations.new_count",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub schema_version: u32,
    pub written_at: DateTime<Utc>,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionRecord {
    pub customization: Customization,
    /// Ticket of the write that produced this record.
    #[serde(default)]
    pub sequence: u64,
}

pub struct CustomizationStateStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CustomizationStateStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    async fn read<T: DeserializeOwned>(&self, key: StateKey) -> Result<Option<T>, TailorError> {
        let Some(raw) = self.backend.get(key.as_str()).await? else {
            return Ok(None);
        };

        let envelope: Envelope<T> = match serde_json::from_value(raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::warn!(
                    "Discarding unreadable value for '{}': {}",
                    key.as_str(),
                    e
                );
                return Ok(None);
            }
        };

        if envelope.schema_version > SCHEMA_VERSION {
            log::warn!(
                "Ignoring '{}' written with schema version {} (supported: {})",
                key.as_str(),
                envelope.schema_version,
                SCHEMA_VERSION
            );
            return Ok(None);
        }

        Ok(Some(envelope.data))
    }

    async fn write<T: Serialize>(&self, key: StateKey, data: T) -> Result<(), TailorError> {
        let envelope = Envelope {
            schema_version: SCHEMA_VERSION,
            written_at: Utc::now(),
            data,
        };
        let value = serde_json::to_value(&envelope)
            .map_err(|e| TailorError::storage(key.as_str(), e.to_string()))?;
        self.backend.set(key.as_str(), value).await
    }

    pub async fn selection(&self, identity: &str) -> Result<Option<SelectionRecord>, TailorError> {
        let records: HashMap<String, SelectionRecord> = self
            .read(StateKey::SelectionByIdentity)
            .await?
            .unwrap_or_default();
        Ok(records.get(identity).cloned())
    }

    /// Commits a selection unless a write with a newer ticket already landed.
    /// Returns whether the write was applied.
    pub async fn set_selection(
        &self,
        identity: &str,
        customization: Customization,
        sequence: u64,
    ) -> Result<bool, TailorError> {
        let mut records: HashMap<String, SelectionRecord> = self
            .read(StateKey::SelectionByIdentity)
            .await?
            .unwrap_or_default();

        if let Some(existing) = records.get(identity) {
            if existing.sequence > sequence {
                log::debug!(
                    "Dropping stale selection write for {} (ticket {} < committed {})",
                    identity,
                    sequence,
                    existing.sequence
                );
                return Ok(false);
            }
        }

        records.insert(
            identity.to_string(),
            SelectionRecord {
                customization,
                sequence,
            },
        );
        self.write(StateKey::SelectionByIdentity, records).await?;
        Ok(true)
    }

    pub async fn snapshot(&self, identity: &str) -> Result<Vec<Customization>, TailorError> {
        let snapshots: HashMap<String, Vec<Customization>> = self
            .read(StateKey::SnapshotByIdentity)
            .await?
            .unwrap_or_default();
        Ok(snapshots.get(identity).cloned().unwrap_or_default())
    }

    /// Replaces the identity's snapshot wholesale.
    pub async fn set_snapshot(
        &self,
        identity: &str,
        customizations: Vec<Customization>,
    ) -> Result<(), TailorError> {
        let mut snapshots: HashMap<String, Vec<Customization>> = self
            .read(StateKey::SnapshotByIdentity)
            .await?
            .unwrap_or_default();
        snapshots.insert(identity.to_string(), customizations);
        self.write(StateKey::SnapshotByIdentity, snapshots).await
    }

    pub async fn override_marker(&self) -> Result<Option<String>, TailorError> {
        self.read(StateKey::OverrideMarker).await
    }

    pub async fn set_override_marker(&self, identifier: &str) -> Result<(), TailorError> {
        self.write(StateKey::OverrideMarker, identifier.to_string()).await
    }

    pub async fn new_count(&self) -> Result<usize, TailorError> {
        Ok(self.read(StateKey::NewCount).await?.unwrap_or(0))
    }

    pub async fn set_new_count(&self, count: usize) -> Result<(), TailorError> {
        self.write(StateKey::NewCount, count).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> (Arc<InMemoryStore>, CustomizationStateStore) {
        let backend = Arc::new(InMemoryStore::new());
        let typed = CustomizationStateStore::new(backend.clone());
        (backend, typed)
    }

    #[tokio::test]
    async fn test_selection_is_keyed_per_identity() {
        let (_, store) = store();
        store
            .set_selection("alice", Customization::new("A", "Alpha"), 1)
            .await
            .unwrap();

        let alice = store.selection("alice").await.unwrap().unwrap();
        assert_eq!(alice.customization.identifier, "A");
        assert!(store.selection("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_selection_write_is_dropped() {
        let (_, store) = store();
        assert!(store
            .set_selection("alice", Customization::new("B", "Beta"), 7)
            .await
            .unwrap());
        assert!(!store
            .set_selection("alice", Customization::new("A", "Alpha"), 6)
            .await
            .unwrap());

        let record = store.selection("alice").await.unwrap().unwrap();
        assert_eq!(record.customization.identifier, "B");
        assert_eq!(record.sequence, 7);
    }

    #[tokio::test]
    async fn test_snapshot_is_overwritten_wholesale() {
        let (_, store) = store();
        store
            .set_snapshot("alice", vec![Customization::new("A", "Alpha"), Customization::new("B", "Beta")])
            .await
            .unwrap();
        store
            .set_snapshot("alice", vec![Customization::new("C", "Gamma")])
            .await
            .unwrap();

        let snapshot = store.snapshot("alice").await.unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].identifier, "C");
    }

    #[tokio::test]
    async fn test_newer_schema_version_is_treated_as_absent() {
        let (backend, store) = store();
        backend
            .set(
                StateKey::NewCount.as_str(),
                json!({ "schema_version": SCHEMA_VERSION + 1, "written_at": Utc::now(), "data": 4 }),
            )
            .await
            .unwrap();

        assert_eq!(store.new_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unenveloped_value_is_treated_as_absent() {
        let (backend, store) = store();
        backend
            .set(StateKey::OverrideMarker.as_str(), json!("raw-string"))
            .await
            .unwrap();

        assert_eq!(store.override_marker().await.unwrap(), None);
        store.set_override_marker("X").await.unwrap();
        assert_eq!(store.override_marker().await.unwrap(), Some("X".to_string()));
    }
}
