//! Scoped installation token cache.

use crate::error::TokenError;
use crate::exchange::{GitHubExchange, TokenExchange};
use crate::minter::Minter;
use chrono::{DateTime, Duration, Utc};
use drover_core::{GitHubAppConfig, ScopeKey, short_repo_names};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cached tokens are only served while more than this much validity remains.
pub const REFRESH_MARGIN_SECS: i64 = 5 * 60;

/// An installation access token and its absolute expiry.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(value: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            expires_at,
        }
    }

    /// The raw token.
    pub fn secret(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the token can still be handed out at `now`.
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A cache entry. Replaced wholesale on refresh.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub scope_key: ScopeKey,
    pub token: AccessToken,
}

/// Mints and caches repository-scoped installation tokens.
///
/// One lock covers the whole check-then-mint sequence, so concurrent
/// callers for an expiring scope trigger a single upstream exchange.
pub struct TokenProvider {
    minter: Minter,
    exchange: Arc<dyn TokenExchange>,
    cache: Mutex<HashMap<ScopeKey, CachedToken>>,
}

impl TokenProvider {
    pub fn new(minter: Minter, exchange: Arc<dyn TokenExchange>) -> Self {
        Self {
            minter,
            exchange,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Build a provider that talks to GitHub with the configured app.
    ///
    /// The private key must already be resolved (see
    /// `BrokerConfig::require_credentials`).
    pub fn from_config(config: &GitHubAppConfig) -> Result<Self, TokenError> {
        let pem = config
            .private_key
            .as_ref()
            .ok_or_else(|| TokenError::Signing("no private key configured".to_string()))?;
        let minter = Minter::from_pem(config.app_id.clone(), pem)?;
        let exchange = GitHubExchange::new(
            config.api_base_url.clone(),
            config.installation_id.clone(),
            config.request_timeout(),
        )?;
        Ok(Self::new(minter, Arc::new(exchange)))
    }

    /// Return a token scoped to exactly `repos`.
    ///
    /// Serves the cached token for the scope while it has more than
    /// [`REFRESH_MARGIN_SECS`] left; otherwise mints a new one. A failed
    /// exchange leaves the cache untouched.
    pub async fn get_token(&self, repos: &[String]) -> Result<AccessToken, TokenError> {
        let key = ScopeKey::from_repos(repos);
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.get(&key) {
            if cached.token.is_fresh(Utc::now()) {
                tracing::debug!(scope = %key, "serving cached installation token");
                return Ok(cached.token.clone());
            }
        }

        let assertion = self.minter.mint()?;
        let token = self
            .exchange
            .exchange(&assertion, &short_repo_names(repos))
            .await
            .inspect_err(|e| tracing::warn!(scope = %key, error = %e, "token exchange failed"))?;

        tracing::info!(
            scope = %key,
            expires_at = %token.expires_at(),
            "minted installation token"
        );

        cache.insert(
            key.clone(),
            CachedToken {
                scope_key: key,
                token: token.clone(),
            },
        );
        Ok(token)
    }

    /// The cached token for `repos`, fresh or not.
    pub async fn cached_token(&self, repos: &[String]) -> Option<AccessToken> {
        let key = ScopeKey::from_repos(repos);
        self.cache
            .lock()
            .await
            .get(&key)
            .map(|cached| cached.token.clone())
    }
}

impl fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenProvider")
            .field("minter", &self.minter)
            .finish_non_exhaustive()
    }
}
