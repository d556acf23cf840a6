//! Error types for tenant endpoints.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while creating or talking to a tenant endpoint.
#[derive(Debug, Error)]
pub enum SocketError {
    /// Tenant name cannot be used as a path component.
    #[error("invalid tenant name: {0:?}")]
    InvalidTenantName(String),

    /// Failed to bind the tenant socket.
    #[error("failed to bind {path}: {source}")]
    Bind {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Filesystem error preparing the socket directory.
    #[error("failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Could not complete a request against a tenant socket.
    #[error("request to {path} failed: {message}")]
    Client { path: PathBuf, message: String },

    /// The endpoint answered with a non-200 status.
    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
}
