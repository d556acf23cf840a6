//! GitHub App JWT minting.
//!
//! GitHub authenticates an app by a short RS256 JWT whose issuer is the app
//! id. The assertion is minted fresh for every token exchange and never
//! cached.

use crate::error::TokenError;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backdating applied to `iat` to absorb clock skew with GitHub.
const CLOCK_SKEW_SECS: i64 = 60;

/// Lifetime of an assertion. GitHub rejects anything above 10 minutes.
const ASSERTION_LIFETIME_SECS: i64 = 600;

/// Registered claims of the app assertion.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppClaims {
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// A signed app JWT, ready to be sent as a bearer credential.
pub struct SignedAssertion(String);

impl SignedAssertion {
    /// The encoded JWT.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SignedAssertion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SignedAssertion([REDACTED])")
    }
}

/// Signs app assertions with the GitHub App private key.
pub struct Minter {
    app_id: String,
    key: EncodingKey,
}

impl Minter {
    /// Parse a PEM-encoded RSA private key (PKCS#1 or PKCS#8).
    pub fn from_pem(app_id: impl Into<String>, pem: &SecretString) -> Result<Self, TokenError> {
        let key = EncodingKey::from_rsa_pem(pem.expose_secret().as_bytes())
            .map_err(|e| TokenError::Signing(e.to_string()))?;

        Ok(Self {
            app_id: app_id.into(),
            key,
        })
    }

    /// The app id used as issuer.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Sign a new assertion valid from one minute ago to ten minutes from now.
    pub fn mint(&self) -> Result<SignedAssertion, TokenError> {
        let now = Utc::now().timestamp();
        let claims = AppClaims {
            iat: now - CLOCK_SKEW_SECS,
            exp: now + ASSERTION_LIFETIME_SECS,
            iss: self.app_id.clone(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &self.key)
            .map(SignedAssertion)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl fmt::Debug for Minter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Minter")
            .field("app_id", &self.app_id)
            .finish_non_exhaustive()
    }
}
