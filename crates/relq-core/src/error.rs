//! Error types for relq-core

use thiserror::Error;

/// Core error type for relq
#[derive(Error, Debug)]
pub enum CoreError {
    /// RC001: Configuration file not found
    #[error("[RC001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// RC002: Invalid configuration value
    #[error("[RC002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// RC003: IO error with file path context
    #[error("[RC003] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// RC004: YAML parse error
    #[error("[RC004] Config parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
