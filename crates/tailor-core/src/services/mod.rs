//! Collaborator interfaces consumed by the coordinator.
//!
//! The coordinator owns no I/O of its own. Listing, scope management,
//! identity, persistence and every user-facing surface are reached through
//! these traits so that a host can plug in its own widgets and transports.
//! Reference implementations live in `remote`, `storage`, `profiles` and
//! `terminal`.

use crate::core_types::{
    ListingPage, NotificationAction, PickerItem, PromptOptions, Scope, ScopeChangeReason,
};
use crate::errors::TailorError;
use async_trait::async_trait;
use serde_json::Value;

#[async_trait]
pub trait RemoteListingService: Send + Sync {
    /// Fetch one page of customizations visible under `scope_token`.
    async fn list_page(
        &self,
        scope_token: Option<&str>,
        next_token: Option<&str>,
    ) -> Result<ListingPage, TailorError>;
}

#[async_trait]
pub trait ScopeProvider: Send + Sync {
    async fn list_scopes(&self) -> Result<Vec<Scope>, TailorError>;
    async fn active_scope(&self) -> Option<Scope>;
    async fn switch_scope(&self, target: &Scope, reason: ScopeChangeReason) -> Result<(), TailorError>;
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity_key(&self) -> Option<String>;
    async fn is_feature_eligible(&self) -> bool;
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>, TailorError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), TailorError>;
}

#[async_trait]
pub trait PromptService: Send + Sync {
    /// Returns the index of the chosen item, or `None` when cancelled.
    async fn show_selection(
        &self,
        items: &[PickerItem],
        options: &PromptOptions,
    ) -> Result<Option<usize>, TailorError>;
}

#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn info(&self, message: &str, actions: &[NotificationAction]) -> Option<NotificationAction>;
    async fn warn(&self, message: &str, actions: &[NotificationAction]) -> Option<NotificationAction>;

    async fn open_link(&self, url: &str) {
        log::info!("More information: {}", url);
    }
}

/// Receives the refresh signal for status indicators.
pub trait StatusListener: Send + Sync {
    fn refresh_status(&self);
}

/// Listener for hosts without status indicators.
pub struct NoOpStatusListener;

impl StatusListener for NoOpStatusListener {
    fn refresh_status(&self) {}
}
