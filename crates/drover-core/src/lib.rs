//! # drover-core
//!
//! Shared types for the Drover credential broker.
//!
//! Drover hands short-lived, repository-scoped GitHub tokens to sandboxed
//! tenant containers ("drones") over one Unix socket per tenant. This crate
//! holds the pieces every other crate agrees on:
//!
//! - [`ScopeKey`]: the order-independent cache key for a set of repositories
//! - [`parse_repos`] / [`short_repo_names`]: label parsing and upstream naming
//! - [`config`]: broker configuration loaded from TOML, dotenv files and the
//!   process environment

pub mod config;
pub mod error;
pub mod scope;

pub use config::{BrokerConfig, GitHubAppConfig, OrchestratorConfig, SocketConfig};
pub use error::ConfigError;
pub use scope::{ScopeKey, parse_repos, short_repo_names};
