//! Error types for token minting.

use thiserror::Error;

/// Errors that can occur while minting an installation token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The app private key is malformed or the JWT could not be signed.
    #[error("failed to sign app assertion: {0}")]
    Signing(String),

    /// GitHub answered the token exchange with a non-201 status.
    #[error("GitHub token exchange returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The token exchange request could not be completed (connect, timeout).
    #[error("GitHub token exchange request failed: {0}")]
    Request(String),

    /// GitHub returned 201 but the body was not a token response.
    #[error("invalid token exchange response: {0}")]
    InvalidResponse(String),
}
