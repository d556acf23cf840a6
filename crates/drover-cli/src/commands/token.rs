//! `drover token` - mint a scoped token from the command line.

use anyhow::Context;
use drover_core::{BrokerConfig, ScopeKey, parse_repos};
use drover_token::TokenProvider;
use std::path::Path;

pub async fn token(config_path: Option<&Path>, repos: Vec<String>) -> anyhow::Result<()> {
    let config = BrokerConfig::load(config_path).context("loading configuration")?;
    config
        .require_credentials()
        .context("missing GitHub App credentials")?;

    // `--repo a,b` and `--repo a --repo b` are equivalent.
    let repos: Vec<String> = repos.iter().flat_map(|r| parse_repos(r)).collect();
    anyhow::ensure!(!repos.is_empty(), "at least one repository is required");

    let provider = TokenProvider::from_config(&config.github).context("creating token provider")?;
    let token = provider
        .get_token(&repos)
        .await
        .with_context(|| format!("minting token for {}", ScopeKey::from_repos(&repos)))?;

    tracing::info!(expires_at = %token.expires_at(), "token minted");
    println!("{}", token.secret());
    Ok(())
}
