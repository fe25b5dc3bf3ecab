//! Error types for springboard-core

use thiserror::Error;

/// Result type alias using springboard-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Springboard
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration format
    #[error("Invalid configuration format: {message}")]
    InvalidConfig { message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Host version could not be parsed
    #[error("Invalid host version format: {version}")]
    InvalidVersion { version: String },

    /// Unknown component type
    #[error("Unknown component type: {kind}. Valid types: extension, skin")]
    InvalidComponentKind { kind: String },

    /// Unknown lifecycle action
    #[error("Unknown action: {action}. Valid actions: install, uninstall")]
    InvalidAction { action: String },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid version error
    pub fn invalid_version(version: impl Into<String>) -> Self {
        Self::InvalidVersion {
            version: version.into(),
        }
    }

    /// Create an invalid component kind error
    pub fn invalid_component_kind(kind: impl Into<String>) -> Self {
        Self::InvalidComponentKind { kind: kind.into() }
    }

    /// Create an invalid action error
    pub fn invalid_action(action: impl Into<String>) -> Self {
        Self::InvalidAction {
            action: action.into(),
        }
    }
}
