//! Upstream token exchange.

use crate::error::TokenError;
use crate::minter::SignedAssertion;
use crate::provider::AccessToken;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Exchanges an app assertion for a repository-scoped access token.
#[async_trait]
pub trait TokenExchange: Send + Sync {
    /// Request a token limited to `repositories` (short names, no org prefix).
    async fn exchange(
        &self,
        assertion: &SignedAssertion,
        repositories: &[String],
    ) -> Result<AccessToken, TokenError>;
}

#[derive(Debug, Serialize)]
struct InstallationTokenRequest<'a> {
    repositories: &'a [String],
}

#[derive(Debug, Deserialize)]
struct InstallationTokenResponse {
    token: String,
    expires_at: DateTime<Utc>,
}

/// Token exchange against the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GitHubExchange {
    client: reqwest::Client,
    api_base_url: String,
    installation_id: String,
}

impl GitHubExchange {
    /// Build an exchange client whose requests are bounded by `timeout`.
    pub fn new(
        api_base_url: impl Into<String>,
        installation_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TokenError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(concat!("drover/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TokenError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_base_url: api_base_url.into(),
            installation_id: installation_id.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/app/installations/{}/access_tokens",
            self.api_base_url.trim_end_matches('/'),
            self.installation_id
        )
    }
}

#[async_trait]
impl TokenExchange for GitHubExchange {
    async fn exchange(
        &self,
        assertion: &SignedAssertion,
        repositories: &[String],
    ) -> Result<AccessToken, TokenError> {
        let response = self
            .client
            .post(self.endpoint())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .bearer_auth(assertion.expose())
            .json(&InstallationTokenRequest { repositories })
            .send()
            .await
            .map_err(|e| TokenError::Request(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::CREATED {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read response body".to_string());
            return Err(TokenError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let payload: InstallationTokenResponse = response
            .json()
            .await
            .map_err(|e| TokenError::InvalidResponse(e.to_string()))?;

        Ok(AccessToken::new(payload.token, payload.expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_strips_trailing_slash() {
        let exchange =
            GitHubExchange::new("https://ghe.example.com/api/v3/", "42", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            exchange.endpoint(),
            "https://ghe.example.com/api/v3/app/installations/42/access_tokens"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let repos = vec!["repoA".to_string(), "repoB".to_string()];
        let body = serde_json::to_value(InstallationTokenRequest {
            repositories: &repos,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({ "repositories": ["repoA", "repoB"] }));
    }
}
