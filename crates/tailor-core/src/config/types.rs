//! Configuration type definitions
//!
//! Every section except `service` is optional. A minimal file only names the
//! listing endpoint; the identity may then come from the environment.

use crate::core_types::Scope;
use crate::errors::TailorError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;

pub const DEFAULT_LEARN_MORE_URL: &str =
    "https://docs.aws.amazon.com/amazonq/latest/qdeveloper-ug/customizations.html";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TailorConfig {
    pub service: ServiceConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// Customization to apply automatically, at most once per distinct value.
    #[serde(default, rename = "override")]
    pub override_customization: Option<String>,
    #[serde(default = "default_learn_more_url")]
    pub learn_more_url: String,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub auth_token_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub key_env: Option<String>,
    #[serde(default = "default_true")]
    pub feature_eligible: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilesConfig {
    #[serde(default)]
    pub scopes: Vec<Scope>,
    /// Identifier of the scope active at startup.
    #[serde(default)]
    pub active: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_learn_more_url() -> String {
    DEFAULT_LEARN_MORE_URL.to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key: None,
            key_env: None,
            feature_eligible: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl StorageConfig {
    /// Configured state file, or `<data dir>/tailor/state.json`.
    pub fn resolved_state_file(&self) -> PathBuf {
        if let Some(path) = &self.state_file {
            return path.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tailor")
            .join("state.json")
    }
}

impl TailorConfig {
    pub fn validate(&self) -> Result<(), TailorError> {
        let endpoint = self.service.endpoint.trim();
        if endpoint.is_empty() {
            return Err(TailorError::ConfigError("Service endpoint cannot be empty".to_string()));
        }
        if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
            return Err(TailorError::ConfigError(format!(
                "Service endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }

        if self.service.timeout_secs == 0 {
            return Err(TailorError::ConfigError("Service timeout_secs must be greater than 0".to_string()));
        }

        if self.service.page_size == Some(0) {
            return Err(TailorError::ConfigError("Service page_size must be greater than 0".to_string()));
        }

        let mut seen = HashSet::new();
        for scope in &self.profiles.scopes {
            if scope.identifier.is_empty() {
                return Err(TailorError::ConfigError(format!(
                    "Profile '{}' has an empty identifier",
                    scope.name
                )));
            }
            if !seen.insert(scope.identifier.as_str()) {
                return Err(TailorError::ConfigError(format!(
                    "Duplicate profile identifier '{}'",
                    scope.identifier
                )));
            }
        }

        if let Some(active) = &self.profiles.active {
            if !seen.contains(active.as_str()) {
                return Err(TailorError::ConfigError(format!(
                    "Active profile '{}' is not listed in profiles.scopes",
                    active
                )));
            }
        }

        Ok(())
    }
}
