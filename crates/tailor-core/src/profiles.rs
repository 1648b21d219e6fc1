//! Config-backed scope and identity providers.
//!
//! Hosts with their own connection manager implement `ScopeProvider` and
//! `IdentityProvider` directly; these adapters cover the CLI, where the
//! profiles and identity come from `tailor.yaml` and the active profile is
//! remembered in the state store.

use crate::config::types::{IdentityConfig, ProfilesConfig};
use crate::core_types::{Scope, ScopeChangeReason};
use crate::errors::TailorError;
use crate::services::{IdentityProvider, KeyValueStore, ScopeProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const ACTIVE_PROFILE_KEY: &str = "profiles.active";

pub struct ConfiguredScopeProvider {
    scopes: Vec<Scope>,
    active: RwLock<Option<Scope>>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl ConfiguredScopeProvider {
    pub fn new(config: &ProfilesConfig) -> Self {
        let active = config
            .active
            .as_ref()
            .and_then(|id| config.scopes.iter().find(|s| &s.identifier == id))
            .or_else(|| config.scopes.first())
            .cloned();

        Self {
            scopes: config.scopes.clone(),
            active: RwLock::new(active),
            store: None,
        }
    }

    /// Remembers the active profile in `store`, restoring any earlier choice.
    pub async fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        match store.get(ACTIVE_PROFILE_KEY).await {
            Ok(Some(Value::String(id))) => {
                if let Some(scope) = self.find(&id).cloned() {
                    *self.active.get_mut() = Some(scope);
                } else {
                    log::warn!("Remembered profile {} is no longer configured", id);
                }
            }
            Ok(_) => {}
            Err(e) => log::warn!("Failed to read active profile: {}", e),
        }
        self.store = Some(store);
        self
    }

    pub fn find(&self, identifier_or_name: &str) -> Option<&Scope> {
        self.scopes
            .iter()
            .find(|s| s.identifier == identifier_or_name)
            .or_else(|| self.scopes.iter().find(|s| s.name == identifier_or_name))
    }
}

#[async_trait]
impl ScopeProvider for ConfiguredScopeProvider {
    async fn list_scopes(&self) -> Result<Vec<Scope>, TailorError> {
        Ok(self.scopes.clone())
    }

    async fn active_scope(&self) -> Option<Scope> {
        self.active.read().await.clone()
    }

    async fn switch_scope(&self, target: &Scope, reason: ScopeChangeReason) -> Result<(), TailorError> {
        let Some(scope) = self.scopes.iter().find(|s| s.identifier == target.identifier) else {
            return Err(TailorError::scope(&target.identifier, "profile is not configured"));
        };

        if let Some(store) = &self.store {
            store
                .set(ACTIVE_PROFILE_KEY, Value::String(scope.identifier.clone()))
                .await
                .map_err(|e| TailorError::scope(&scope.identifier, e.to_string()))?;
        }

        log::info!("Switched to profile {} ({:?})", scope.name, reason);
        *self.active.write().await = Some(scope.clone());
        Ok(())
    }
}

pub struct ConfiguredIdentity {
    key: Option<String>,
    feature_eligible: bool,
}

impl ConfiguredIdentity {
    pub fn new(config: &IdentityConfig) -> Self {
        Self {
            key: config.key.clone(),
            feature_eligible: config.feature_eligible,
        }
    }
}

#[async_trait]
impl IdentityProvider for ConfiguredIdentity {
    async fn current_identity_key(&self) -> Option<String> {
        self.key.clone()
    }

    async fn is_feature_eligible(&self) -> bool {
        self.feature_eligible
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn profiles() -> ProfilesConfig {
        ProfilesConfig {
            scopes: vec![Scope::new("p1", "Team A"), Scope::new("p2", "Team B")],
            active: Some("p2".to_string()),
        }
    }

    #[tokio::test]
    async fn test_initial_active_scope_comes_from_config() {
        let provider = ConfiguredScopeProvider::new(&profiles());
        assert_eq!(provider.active_scope().await.unwrap().identifier, "p2");

        let no_active = ConfiguredScopeProvider::new(&ProfilesConfig {
            active: None,
            ..profiles()
        });
        assert_eq!(no_active.active_scope().await.unwrap().identifier, "p1");
    }

    #[tokio::test]
    async fn test_switch_to_unknown_scope_fails() {
        let provider = ConfiguredScopeProvider::new(&profiles());
        let result = provider
            .switch_scope(&Scope::new("p9", "Nope"), ScopeChangeReason::User)
            .await;

        assert!(matches!(result, Err(TailorError::ScopeError { .. })));
        assert_eq!(provider.active_scope().await.unwrap().identifier, "p2");
    }

    #[tokio::test]
    async fn test_active_scope_is_remembered() {
        let store: Arc<dyn KeyValueStore> = Arc::new(InMemoryStore::new());

        let provider = ConfiguredScopeProvider::new(&profiles())
            .with_store(store.clone())
            .await;
        provider
            .switch_scope(&Scope::new("p1", "Team A"), ScopeChangeReason::User)
            .await
            .unwrap();

        let reopened = ConfiguredScopeProvider::new(&profiles()).with_store(store).await;
        assert_eq!(reopened.active_scope().await.unwrap().identifier, "p1");
    }

    #[tokio::test]
    async fn test_find_by_name() {
        let provider = ConfiguredScopeProvider::new(&profiles());
        assert_eq!(provider.find("Team B").unwrap().identifier, "p2");
        assert!(provider.find("Team C").is_none());
    }
}
