//! Customization selection coordinator.
//!
//! Ties the collaborators together: lists customizations per scope, keeps the
//! per-identity snapshot used for "new since last check", validates that the
//! stored selection still exists, and drives the picker. Nothing here ever
//! returns an error to the host. Remote, scope and storage failures are logged
//! and the user is left on a valid selection, falling back to the base
//! customization when in doubt.
//!
//! Selection writes are ordered by tickets handed out when an operation
//! starts (see `SessionContext::next_ticket`). A scope-change reconciliation
//! that started before a manual selection therefore cannot revert it.

use crate::availability::{get_new_customizations, is_selected_customization_available};
use crate::core_types::{
    base_customization, Customization, NotificationAction, PickerItem, PromptOptions, Scope,
    ScopeChangeEvent, ScopeChangeReason,
};
use crate::errors::TailorError;
use crate::picker;
use crate::services::{
    IdentityProvider, KeyValueStore, NotificationService, PromptService, RemoteListingService,
    ScopeProvider, StatusListener,
};
use crate::session::SessionContext;
use crate::storage::CustomizationStateStore;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const PROMPT_TITLE: &str = "Select a customization";
pub const PROMPT_PLACEHOLDER: &str = "Choose where code suggestions should come from";

/// Everything the coordinator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub listing: Arc<dyn RemoteListingService>,
    pub scopes: Arc<dyn ScopeProvider>,
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn KeyValueStore>,
    pub prompt: Arc<dyn PromptService>,
    pub notifications: Arc<dyn NotificationService>,
    pub status: Arc<dyn StatusListener>,
}

pub struct CustomizationCoordinator {
    listing: Arc<dyn RemoteListingService>,
    scopes: Arc<dyn ScopeProvider>,
    identity: Arc<dyn IdentityProvider>,
    state: CustomizationStateStore,
    prompt: Arc<dyn PromptService>,
    notifications: Arc<dyn NotificationService>,
    status: Arc<dyn StatusListener>,
    session: Mutex<SessionContext>,
    learn_more_url: String,
}

impl CustomizationCoordinator {
    pub fn new(collaborators: Collaborators, session: SessionContext, learn_more_url: impl Into<String>) -> Self {
        Self {
            listing: collaborators.listing,
            scopes: collaborators.scopes,
            identity: collaborators.identity,
            state: CustomizationStateStore::new(collaborators.store),
            prompt: collaborators.prompt,
            notifications: collaborators.notifications,
            status: collaborators.status,
            session: Mutex::new(session),
            learn_more_url: learn_more_url.into(),
        }
    }

    /// Copy of the current session flags.
    pub async fn session(&self) -> SessionContext {
        self.session.lock().await.clone()
    }

    pub async fn set_limit_reached(&self, reached: bool) {
        self.session.lock().await.limit_reached = reached;
        self.status.refresh_status();
    }

    /// Number of customizations reported new by the last refresh.
    pub async fn new_customizations_count(&self) -> usize {
        self.state.new_count().await.unwrap_or_else(|e| {
            log::warn!("Failed to read new customization count: {}", e);
            0
        })
    }

    // ---- listing ----

    async fn try_list_available(&self, scope: Option<&Scope>) -> Result<Vec<Customization>, TailorError> {
        let scope_token = scope.map(|s| s.identifier.as_str());
        let mut customizations = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let page = self
                .listing
                .list_page(scope_token, next_token.as_deref())
                .await?;
            customizations.extend(page.customizations);

            match page.next_token {
                Some(token) if !token.is_empty() => {
                    if next_token.as_deref() == Some(token.as_str()) {
                        log::warn!(
                            "Listing for scope {:?} returned the same continuation token twice, stopping",
                            scope_token
                        );
                        break;
                    }
                    next_token = Some(token);
                }
                _ => break,
            }
        }

        if let Some(scope) = scope {
            for customization in customizations.iter_mut() {
                if customization.scope.is_none() {
                    customization.scope = Some(scope.clone());
                }
            }
        }

        Ok(customizations)
    }

    /// All customizations visible under `scope`. A failing listing contributes
    /// nothing.
    pub async fn list_available(&self, scope: Option<&Scope>) -> Vec<Customization> {
        match self.try_list_available(scope).await {
            Ok(customizations) => customizations,
            Err(e) => {
                log::error!(
                    "Failed to list customizations for scope {:?}: {}",
                    scope.map(|s| s.identifier.as_str()),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Customizations across every known scope, each tagged with its scope.
    ///
    /// Fails when the scopes cannot be enumerated, or when every scope's
    /// listing failed, since there is then nothing to compare against.
    pub async fn list_available_across_scopes(&self) -> Result<Vec<Customization>, TailorError> {
        let scopes = self.scopes.list_scopes().await.map_err(|e| {
            log::error!("Failed to enumerate scopes: {}", e);
            e
        })?;

        if scopes.is_empty() {
            let active = self.scopes.active_scope().await;
            return self.try_list_available(active.as_ref()).await.map_err(|e| {
                log::error!("Failed to list customizations: {}", e);
                e
            });
        }

        let mut all = Vec::new();
        let mut failures = 0;
        for scope in &scopes {
            match self.try_list_available(Some(scope)).await {
                Ok(customizations) => all.extend(customizations),
                Err(e) => {
                    failures += 1;
                    log::error!(
                        "Failed to list customizations for scope {} ({}): {}",
                        scope.name,
                        scope.identifier,
                        e
                    );
                }
            }
        }

        if failures == scopes.len() {
            return Err(TailorError::TransportError(format!(
                "Listing failed for all {} scopes",
                failures
            )));
        }

        log::debug!(
            "Listed {} customizations across {} scopes ({} failed)",
            all.len(),
            scopes.len(),
            failures
        );
        Ok(all)
    }

    // ---- selection ----

    async fn signed_in_identity(&self) -> Option<String> {
        if !self.identity.is_feature_eligible().await {
            return None;
        }
        self.identity.current_identity_key().await.filter(|k| !k.is_empty())
    }

    /// Identity key when the feature is enabled for this session.
    async fn active_identity(&self) -> Option<String> {
        if !self.session.lock().await.feature_enabled {
            return None;
        }
        self.signed_in_identity().await
    }

    async fn take_ticket(&self, identity: &str) -> u64 {
        let committed = match self.state.selection(identity).await {
            Ok(record) => record.map(|r| r.sequence).unwrap_or(0),
            Err(e) => {
                log::warn!("Failed to read selection for {}: {}", identity, e);
                0
            }
        };
        self.session.lock().await.next_ticket(committed)
    }

    /// Stored selection for the current identity, or the base customization
    /// when the feature is off or nobody is signed in.
    pub async fn get_selected(&self) -> Customization {
        let Some(identity) = self.active_identity().await else {
            return base_customization();
        };

        match self.state.selection(&identity).await {
            Ok(Some(record)) => record.customization,
            Ok(None) => base_customization(),
            Err(e) => {
                log::warn!("Failed to read selection for {}: {}", identity, e);
                base_customization()
            }
        }
    }

    /// Persists `customization` as the current identity's selection. Returns
    /// whether anything was written.
    pub async fn set_selected(&self, customization: Customization, is_override: bool) -> bool {
        let Some(identity) = self.identity.current_identity_key().await.filter(|k| !k.is_empty()) else {
            log::debug!("No identity, not storing selection {}", customization.identifier);
            return false;
        };
        let ticket = self.take_ticket(&identity).await;
        self.write_selection(&identity, customization, is_override, ticket).await
    }

    async fn write_selection(
        &self,
        identity: &str,
        customization: Customization,
        is_override: bool,
        ticket: u64,
    ) -> bool {
        if is_override {
            match self.state.override_marker().await {
                Ok(Some(last)) if last == customization.identifier => {
                    log::debug!("Override {} already applied, skipping", customization.identifier);
                    return false;
                }
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Failed to read override marker: {}", e);
                    return false;
                }
            }
        }

        let identifier = customization.identifier.clone();
        let committed = match self.state.set_selection(identity, customization, ticket).await {
            Ok(committed) => committed,
            Err(e) => {
                log::warn!("Failed to store selection {} for {}: {}", identifier, identity, e);
                return false;
            }
        };
        if !committed {
            return false;
        }

        if is_override {
            if let Err(e) = self.state.set_override_marker(&identifier).await {
                log::warn!("Failed to store override marker {}: {}", identifier, e);
            }
        }

        log::info!("Selected customization '{}' for {}", identifier, identity);
        self.session.lock().await.limit_reached = false;
        self.status.refresh_status();
        true
    }

    async fn switch_to_base_and_notify(&self, identity: &str, previous: &Customization, ticket: u64) {
        if !self.write_selection(identity, base_customization(), false, ticket).await {
            return;
        }

        log::warn!(
            "Customization '{}' ({}) is no longer available, reverted to base",
            previous.name,
            previous.identifier
        );
        let message = format!(
            "Customization {} is no longer available. Suggestions now come from the default model.",
            previous.name
        );
        if let Some(action) = self
            .notifications
            .warn(&message, &[NotificationAction::SelectCustomization])
            .await
        {
            self.handle_action(action).await;
        }
    }

    // ---- entry points ----

    /// Host entry point for active-scope changes.
    pub async fn on_scope_changed(&self, event: ScopeChangeEvent) {
        self.reconcile(event).await;
    }

    pub async fn reconcile(&self, event: ScopeChangeEvent) {
        match event.reason {
            ScopeChangeReason::CustomizationSelection => {
                log::debug!("Scope change caused by a customization selection, skipping validation");
                return;
            }
            ScopeChangeReason::User | ScopeChangeReason::Reauthentication | ScopeChangeReason::Startup => {}
        }

        let Some(identity) = self.active_identity().await else {
            return;
        };
        let ticket = self.take_ticket(&identity).await;

        let Some(scope) = event.scope else {
            log::info!("Active scope cleared, reverting to base customization");
            self.write_selection(&identity, base_customization(), false, ticket).await;
            return;
        };

        let selected = self.get_selected().await;
        if selected.is_base() {
            return;
        }

        let available = self.list_available(Some(&scope)).await;
        if !is_selected_customization_available(&selected, &available) {
            self.switch_to_base_and_notify(&identity, &selected, ticket).await;
        }
    }

    /// Periodic refresh: re-list, validate the selection, and announce
    /// customizations that were not in the previous snapshot.
    pub async fn refresh_and_notify_if_new(&self) {
        // not gated on the feature flag: a successful refresh is what re-enables it
        let Some(identity) = self.signed_in_identity().await else {
            log::debug!("No eligible identity, skipping customization refresh");
            return;
        };
        let ticket = self.take_ticket(&identity).await;

        let available = match self.list_available_across_scopes().await {
            Ok(available) => available,
            Err(e) => {
                log::error!("Failed to refresh customizations for {}: {}", identity, e);
                self.session.lock().await.feature_enabled = false;
                self.write_selection(&identity, base_customization(), false, ticket).await;
                return;
            }
        };
        self.session.lock().await.feature_enabled = true;

        let pending_override = self.session.lock().await.pending_override.clone();
        if let Some(target) = pending_override {
            match available.iter().find(|c| c.identifier == target) {
                Some(customization) => {
                    self.write_selection(&identity, customization.clone(), true, ticket).await;
                }
                None => log::debug!("Override target {} is not available, ignoring", target),
            }
        }

        let selected = self.get_selected().await;
        if !is_selected_customization_available(&selected, &available) {
            self.switch_to_base_and_notify(&identity, &selected, ticket).await;
        }

        let persisted = match self.state.snapshot(&identity).await {
            Ok(persisted) => persisted,
            Err(e) => {
                log::warn!("Failed to read customization snapshot for {}: {}", identity, e);
                Vec::new()
            }
        };
        let new_customizations = get_new_customizations(&available, &persisted);

        if let Err(e) = self.state.set_snapshot(&identity, available).await {
            log::warn!("Failed to store customization snapshot for {}: {}", identity, e);
        }

        if new_customizations.is_empty() {
            return;
        }

        if let Err(e) = self.state.set_new_count(new_customizations.len()).await {
            log::warn!("Failed to store new customization count: {}", e);
        }
        self.status.refresh_status();

        let message = if new_customizations.len() == 1 {
            "You have access to a new customization.".to_string()
        } else {
            format!(
                "You have access to {} new customizations.",
                new_customizations.len()
            )
        };
        if let Some(action) = self
            .notifications
            .info(
                &message,
                &[NotificationAction::SelectCustomization, NotificationAction::LearnMore],
            )
            .await
        {
            self.handle_action(action).await;
        }
    }

    async fn handle_action(&self, action: NotificationAction) {
        match action {
            NotificationAction::SelectCustomization => self.prompt_for_selection().await,
            NotificationAction::LearnMore => self.notifications.open_link(&self.learn_more_url).await,
        }
    }

    async fn picker_items_with_listing(&self) -> (Vec<PickerItem>, Option<Vec<Customization>>) {
        let available = self.list_available_across_scopes().await.ok();

        let persisted = match self.active_identity().await {
            Some(identity) => self.state.snapshot(&identity).await.unwrap_or_else(|e| {
                log::warn!("Failed to read customization snapshot for {}: {}", identity, e);
                Vec::new()
            }),
            None => Vec::new(),
        };
        let selected = self.get_selected().await;

        let items = picker::build_picker_items(available.as_deref(), &persisted, &selected);
        (items, available)
    }

    /// Rows for the selection prompt, base item first.
    pub async fn build_picker_items(&self) -> Vec<PickerItem> {
        self.picker_items_with_listing().await.0
    }

    /// Makes `customization` the current selection, switching to its scope
    /// first when it lives under a different one.
    pub async fn apply_selection(&self, customization: Customization) {
        let Some(identity) = self.active_identity().await else {
            log::debug!("Customizations unavailable for this session, ignoring selection");
            return;
        };

        let selected = self.get_selected().await;
        if selected.identifier == customization.identifier {
            log::debug!("Customization '{}' is already selected", customization.identifier);
            return;
        }
        let ticket = self.take_ticket(&identity).await;

        if let Some(target) = &customization.scope {
            let active = self.scopes.active_scope().await;
            if active.as_ref().map(|s| s.identifier.as_str()) != Some(target.identifier.as_str()) {
                if let Err(e) = self
                    .scopes
                    .switch_scope(target, ScopeChangeReason::CustomizationSelection)
                    .await
                {
                    log::error!(
                        "Failed to switch to scope {} for customization {}: {}",
                        target.identifier,
                        customization.identifier,
                        e
                    );
                    return;
                }
            }
        }

        let message = if customization.is_base() {
            "Code suggestions now come from the default model.".to_string()
        } else {
            format!(
                "Code suggestions now come from the {} customization.",
                customization.name
            )
        };

        if self.write_selection(&identity, customization, false, ticket).await {
            self.notifications.info(&message, &[]).await;
        }
    }

    /// User command: show the picker and apply the choice.
    pub async fn prompt_for_selection(&self) {
        let Some(identity) = self.active_identity().await else {
            log::info!("Customizations unavailable for this session");
            return;
        };

        if let Err(e) = self.state.set_new_count(0).await {
            log::warn!("Failed to reset new customization count: {}", e);
        }
        self.status.refresh_status();

        let (items, available) = self.picker_items_with_listing().await;
        let options = PromptOptions {
            title: PROMPT_TITLE.to_string(),
            placeholder: PROMPT_PLACEHOLDER.to_string(),
        };
        let choice = self.prompt.show_selection(&items, &options).await;

        // seen once in the picker, no longer new
        if let Some(available) = available {
            if let Err(e) = self.state.set_snapshot(&identity, available).await {
                log::warn!("Failed to store customization snapshot for {}: {}", identity, e);
            }
        }

        match choice {
            Ok(Some(index)) => match items.get(index) {
                Some(item) => self.apply_selection(item.customization.clone()).await,
                None => log::warn!("Prompt returned out-of-range index {}", index),
            },
            Ok(None) => log::debug!("Customization prompt cancelled"),
            Err(e) => log::error!("Customization prompt failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::{IdentityConfig, ProfilesConfig};
    use crate::core_types::ListingPage;
    use crate::profiles::{ConfiguredIdentity, ConfiguredScopeProvider};
    use crate::remote::HttpListingClient;
    use crate::services::NoOpStatusListener;
    use crate::storage::InMemoryStore;
    use crate::terminal::{TerminalNotifier, TerminalPrompt};
    use crate::test_utils::mock_listing_server::MockListingServer;

    fn coordinator_for(endpoint: String) -> CustomizationCoordinator {
        let profiles = ProfilesConfig {
            scopes: vec![Scope::new("profile-1", "Team A")],
            active: None,
        };
        let identity = IdentityConfig {
            key: Some("https://start.example.com".to_string()),
            ..Default::default()
        };

        CustomizationCoordinator::new(
            Collaborators {
                listing: Arc::new(HttpListingClient::new(endpoint)),
                scopes: Arc::new(ConfiguredScopeProvider::new(&profiles)),
                identity: Arc::new(ConfiguredIdentity::new(&identity)),
                store: Arc::new(InMemoryStore::new()),
                prompt: Arc::new(TerminalPrompt),
                notifications: Arc::new(TerminalNotifier::new(false)),
                status: Arc::new(NoOpStatusListener),
            },
            SessionContext::new(),
            "https://example.com/docs",
        )
    }

    #[tokio::test]
    async fn test_refresh_over_http_walks_all_pages() {
        let server = MockListingServer::start(vec![
            Ok(ListingPage {
                customizations: vec![Customization::new("A", "Alpha"), Customization::new("B", "Beta")],
                next_token: Some("t2".to_string()),
            }),
            Ok(ListingPage {
                customizations: vec![Customization::new("C", "Charlie")],
                next_token: None,
            }),
        ])
        .await;

        let coordinator = coordinator_for(server.address());
        coordinator.refresh_and_notify_if_new().await;

        assert_eq!(coordinator.new_customizations_count().await, 3);
        assert!(coordinator.session().await.feature_enabled);

        let requests = server.recorded_requests.lock().unwrap().clone();
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().all(|r| r.profile_arn.as_deref() == Some("profile-1")));
        assert_eq!(requests[1].next_token.as_deref(), Some("t2"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_refresh_over_http_disables_feature_when_service_is_down() {
        let server = MockListingServer::start(vec![Err(500)]).await;

        let coordinator = coordinator_for(server.address());
        coordinator.refresh_and_notify_if_new().await;

        assert!(!coordinator.session().await.feature_enabled);
        assert!(coordinator.get_selected().await.is_base());

        server.shutdown().await;
    }
}
