//! Error types for configuration loading.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or validating broker configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration or key file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the expected schema.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A required setting is empty.
    #[error("{field} is not set (set {env})")]
    MissingField { field: &'static str, env: &'static str },
}
