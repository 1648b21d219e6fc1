//! Error types for customization listing, selection, and persistence
//!
//! Failures are grouped by the collaborator that produced them: the remote
//! listing service, the scope (profile) provider, and the key-value store.
//! The coordinator never lets these escape its entry points; it catches them
//! at the boundary, logs them, and degrades to the base customization. The
//! adapters and the configuration layer return them directly.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TailorError {
    #[error("Customization listing failed: {0}")]
    TransportError(String),
    #[error("Scope operation failed for '{scope}': {message}")]
    ScopeError { scope: String, message: String },
    #[error("Storage operation failed for key '{key}': {message}")]
    StorageError { key: String, message: String },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Parsing error: {0}")]
    ParsingError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("Prompt error: {0}")]
    PromptError(String),
}

impl TailorError {
    pub fn scope(scope: impl Into<String>, message: impl Into<String>) -> Self {
        TailorError::ScopeError {
            scope: scope.into(),
            message: message.into(),
        }
    }

    pub fn storage(key: impl Into<String>, message: impl Into<String>) -> Self {
        TailorError::StorageError {
            key: key.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for TailorError {
    fn from(err: std::io::Error) -> Self {
        TailorError::IoError(err.to_string())
    }
}

impl From<reqwest::Error> for TailorError {
    fn from(err: reqwest::Error) -> Self {
        TailorError::TransportError(err.to_string())
    }
}

impl From<serde_json::Error> for TailorError {
    fn from(err: serde_json::Error) -> Self {
        TailorError::ParsingError(err.to_string())
    }
}
