//! Core domain types shared by the coordinator, the picker and the adapters
//!
//! A `Customization` is a remotely defined configuration that alters code
//! suggestions. It is only ever created by a listing call and never mutated
//! afterwards; the next successful listing simply supersedes it. The empty
//! identifier is reserved for the base customization, which stands for
//! "no customization applied" and is valid regardless of remote state.

use serde::{Deserialize, Serialize};

pub const BASE_CUSTOMIZATION_NAME: &str = "Foundation (Default)";
pub const BASE_CUSTOMIZATION_DESCRIPTION: &str = "Receive suggestions from the foundation model";

/// An access boundary (profile) under which a set of customizations is visible.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Scope {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub region: Option<String>,
}

impl Scope {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            region: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customization {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
}

impl Customization {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            description: String::new(),
            scope: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn is_base(&self) -> bool {
        self.identifier.is_empty()
    }

    /// Account field of an ARN-shaped identifier
    /// (`arn:<partition>:<service>:<region>:<account>:<resource>`).
    pub fn account_id(&self) -> Option<&str> {
        let mut parts = self.identifier.splitn(6, ':');
        if parts.next()? != "arn" {
            return None;
        }
        let account = parts.nth(3)?;
        // the resource part must exist for the identifier to be well formed
        parts.next()?;
        if account.is_empty() {
            None
        } else {
            Some(account)
        }
    }

    /// Marker used to tell apart customizations that share a display name.
    pub fn disambiguation_marker(&self) -> &str {
        if let Some(account) = self.account_id() {
            return account;
        }
        match &self.scope {
            Some(scope) if !scope.name.is_empty() => &scope.name,
            _ => &self.identifier,
        }
    }
}

/// The sentinel meaning "no customization selected / default behavior".
pub fn base_customization() -> Customization {
    Customization {
        identifier: String::new(),
        name: BASE_CUSTOMIZATION_NAME.to_string(),
        description: BASE_CUSTOMIZATION_DESCRIPTION.to_string(),
        scope: None,
    }
}

/// One page returned by the remote listing service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListingPage {
    #[serde(default)]
    pub customizations: Vec<Customization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// Why the active scope changed. Selection-driven switches must not trigger
/// availability validation, since the selection that caused them is about to
/// be persisted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScopeChangeReason {
    User,
    CustomizationSelection,
    Reauthentication,
    Startup,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScopeChangeEvent {
    pub scope: Option<Scope>,
    pub reason: ScopeChangeReason,
}

impl ScopeChangeEvent {
    pub fn new(scope: Option<Scope>, reason: ScopeChangeReason) -> Self {
        Self { scope, reason }
    }
}

/// Actions offered alongside notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationAction {
    SelectCustomization,
    LearnMore,
}

impl NotificationAction {
    pub fn label(&self) -> &'static str {
        match self {
            NotificationAction::SelectCustomization => "Select customization",
            NotificationAction::LearnMore => "Learn more",
        }
    }
}

/// One row of the selection prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct PickerItem {
    pub label: String,
    pub description: String,
    pub detail: String,
    pub customization: Customization,
    pub is_new: bool,
    pub recently_used: bool,
    pub invalid_selection: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PromptOptions {
    pub title: String,
    pub placeholder: String,
}
