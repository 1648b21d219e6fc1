//! Configuration for the customization selector
//!
//! A single YAML document describes the listing service, the identity the
//! host is signed in as, the profiles (scopes) it can switch between, and
//! where selection state is persisted.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;
