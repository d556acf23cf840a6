//! In-memory token exchange for tests.
//!
//! Mints predictable tokens without calling GitHub and counts every call,
//! so cache behaviour can be asserted exactly.

use crate::error::TokenError;
use crate::exchange::TokenExchange;
use crate::minter::{Minter, SignedAssertion};
use crate::provider::{AccessToken, TokenProvider};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use secrecy::SecretString;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// RSA key used to sign assertions in tests. Not a real app key.
pub const TEST_APP_KEY: &str = include_str!("../tests/fixtures/test_app_key.pem");

/// Public half of [`TEST_APP_KEY`].
pub const TEST_APP_PUBLIC_KEY: &str = include_str!("../tests/fixtures/test_app_key.pub.pem");

/// Scriptable [`TokenExchange`].
///
/// Tokens look like `ghs_mock_<n>_<repo>+<repo>` so a test can see which
/// scope a token was minted for.
#[derive(Debug)]
pub struct MockExchange {
    calls: AtomicUsize,
    fail_status: AtomicU16,
    ttl_secs: Mutex<i64>,
    delay: std::time::Duration,
    last_repositories: Mutex<Vec<String>>,
}

impl MockExchange {
    /// Tokens expire `ttl` after they are minted.
    pub fn new(ttl: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_status: AtomicU16::new(0),
            ttl_secs: Mutex::new(ttl.num_seconds()),
            delay: std::time::Duration::ZERO,
            last_repositories: Mutex::new(Vec::new()),
        }
    }

    /// Sleep this long inside every exchange.
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of exchanges attempted, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make subsequent exchanges fail with `status`.
    pub fn fail_with(&self, status: u16) {
        self.fail_status.store(status, Ordering::SeqCst);
    }

    /// Make subsequent exchanges succeed again.
    pub fn succeed(&self) {
        self.fail_status.store(0, Ordering::SeqCst);
    }

    /// Change the lifetime of subsequently minted tokens.
    pub fn set_ttl(&self, ttl: Duration) {
        if let Ok(mut secs) = self.ttl_secs.lock() {
            *secs = ttl.num_seconds();
        }
    }

    /// Repositories sent with the most recent exchange.
    pub fn last_repositories(&self) -> Vec<String> {
        self.last_repositories
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl TokenExchange for MockExchange {
    async fn exchange(
        &self,
        _assertion: &SignedAssertion,
        repositories: &[String],
    ) -> Result<AccessToken, TokenError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut last) = self.last_repositories.lock() {
            *last = repositories.to_vec();
        }

        let status = self.fail_status.load(Ordering::SeqCst);
        if status != 0 {
            return Err(TokenError::Upstream {
                status,
                body: r#"{"message":"Bad credentials"}"#.to_string(),
            });
        }

        let ttl = self.ttl_secs.lock().map(|s| *s).unwrap_or(3600);
        Ok(AccessToken::new(
            format!("ghs_mock_{n}_{}", repositories.join("+")),
            Utc::now() + Duration::seconds(ttl),
        ))
    }
}

/// A [`Minter`] for app `123456` signing with [`TEST_APP_KEY`].
pub fn test_minter() -> Minter {
    match Minter::from_pem("123456", &SecretString::from(TEST_APP_KEY.to_string())) {
        Ok(minter) => minter,
        Err(e) => panic!("test key fixture is invalid: {e}"),
    }
}

/// A provider backed by `exchange` and the test key.
pub fn mock_provider(exchange: Arc<MockExchange>) -> TokenProvider {
    TokenProvider::new(test_minter(), exchange)
}
