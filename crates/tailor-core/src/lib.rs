//! Customization selection for AI code suggestions.
//!
//! This crate tracks which remotely defined customization a user's code
//! suggestions come from. It lists the customizations visible to the current
//! identity across its profiles, remembers the selection per identity,
//! announces customizations that appeared since the last check, and falls
//! back to the base (default) customization whenever the selected one
//! disappears.
//!
//! # Architecture Overview
//!
//! - **Coordinator**: `CustomizationCoordinator` owns the flow and exposes the
//!   three host entry points (`on_scope_changed`, `refresh_and_notify_if_new`,
//!   `prompt_for_selection`)
//! - **Collaborators**: listing, scopes, identity, storage, prompt and
//!   notification surfaces are traits in `services`
//! - **Persistence**: `storage` wraps the raw key-value store in typed,
//!   versioned records
//! - **Adapters**: HTTP listing (`remote`), JSON file store, config-backed
//!   profiles and a dialoguer terminal UI

pub mod availability;
pub mod config;
pub mod coordinator;
pub mod core_types;
pub mod errors;
pub mod picker;
pub mod profiles;
pub mod remote;
pub mod services;
pub mod session;
pub mod storage;
pub mod terminal;

pub use config::{ConfigLoader, TailorConfig};
pub use coordinator::{Collaborators, CustomizationCoordinator};
pub use core_types::{base_customization, Customization, Scope, ScopeChangeEvent, ScopeChangeReason};
pub use errors::TailorError;
pub use session::SessionContext;

#[cfg(test)]
pub mod test_utils;
