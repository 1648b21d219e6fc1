//! Configuration loader for YAML files and environment resolution

use crate::config::types::*;
use crate::errors::TailorError;
use regex::{Captures, Regex};
use std::env;
use std::path::Path;
use tokio::fs;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<TailorConfig, TailorError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).await.map_err(|e| {
            TailorError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_str(&content)?;

        // relative state files live next to the config file
        if let (Some(state_file), Some(base_dir)) = (&config.storage.state_file, path.parent()) {
            if state_file.is_relative() {
                config.storage.state_file = Some(base_dir.join(state_file));
            }
        }

        Ok(config)
    }

    /// Load configuration from a YAML string
    pub fn from_str(content: &str) -> Result<TailorConfig, TailorError> {
        let mut config: TailorConfig = serde_yaml::from_str(content)
            .map_err(|e| TailorError::ConfigError(format!("Failed to parse YAML config: {}", e)))?;

        Self::resolve_environment(&mut config);
        config.validate()?;

        Ok(config)
    }

    fn resolve_environment(config: &mut TailorConfig) {
        config.service.endpoint = Self::expand_env(&config.service.endpoint);

        if let Some(env_var) = &config.service.auth_token_env {
            if let Ok(token) = env::var(env_var) {
                config.service.auth_token = Some(token);
            }
        }

        if let Some(env_var) = &config.identity.key_env {
            if let Ok(key) = env::var(env_var) {
                config.identity.key = Some(key);
            }
        }

        if let Some(key) = &config.identity.key {
            let expanded = Self::expand_env(key);
            config.identity.key = if expanded.is_empty() { None } else { Some(expanded) };
        }
    }

    /// Replaces `${VAR}` references with the variable's value (empty when unset).
    fn expand_env(value: &str) -> String {
        let Ok(re) = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}") else {
            return value.to_string();
        };

        re.replace_all(value, |caps: &Captures| match env::var(&caps[1]) {
            Ok(v) => v,
            Err(_) => {
                log::warn!("Environment variable '{}' referenced in config is not set", &caps[1]);
                String::new()
            }
        })
        .into_owned()
    }
}
