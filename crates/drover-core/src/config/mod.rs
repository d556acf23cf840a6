//! Configuration types for the Drover broker.
//!
//! Configuration is assembled in three layers, lowest precedence first:
//!
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config` or `DROVER_CONFIG`)
//! 3. Environment variables, after `.env` and `/etc/drover.env` have been
//!    folded into the environment (existing variables are never overridden)
//!
//! # Example
//!
//! ```toml
//! [github]
//! app_id = "123456"
//! installation_id = "7890"
//! private_key_file = "/etc/drover/app.pem"
//!
//! [sockets]
//! directory = "/var/run/drover"
//!
//! [orchestrator]
//! managed_label = "drover.managed"
//! ```

pub mod github;
pub mod orchestrator;
pub mod sockets;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub use github::GitHubAppConfig;
pub use orchestrator::OrchestratorConfig;
pub use sockets::SocketConfig;

/// Path of the configuration file, if not given on the command line.
pub const ENV_CONFIG: &str = "DROVER_CONFIG";
/// GitHub App identifier (JWT issuer).
pub const ENV_APP_ID: &str = "DROVER_GITHUB_APP_ID";
/// Installation the scoped tokens are minted for.
pub const ENV_INSTALLATION_ID: &str = "DROVER_GITHUB_INSTALLATION_ID";
/// PEM-encoded app private key, or an absolute path to it.
pub const ENV_APP_KEY: &str = "DROVER_GITHUB_APP_KEY";
/// Override for the GitHub API base URL.
pub const ENV_API_URL: &str = "DROVER_GITHUB_API_URL";
/// Root directory for per-tenant sockets.
pub const ENV_SOCKET_DIR: &str = "DROVER_SOCKET_DIR";

const SYSTEM_ENV_FILE: &str = "/etc/drover.env";

/// Complete broker configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// GitHub App credentials and upstream settings.
    #[serde(default)]
    pub github: GitHubAppConfig,

    /// Per-tenant socket layout.
    #[serde(default)]
    pub sockets: SocketConfig,

    /// Container labels the reconciler reads.
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
}

impl BrokerConfig {
    /// Load configuration from all layers.
    ///
    /// `path` takes precedence over `DROVER_CONFIG`. When neither is set the
    /// built-in defaults are used as the base layer.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        load_env_files();

        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG).map(PathBuf::from));

        let mut cfg = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: Self = toml::from_str(&raw).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        cfg.github.load_private_key_file()?;
        Ok(cfg)
    }

    /// Overlay environment variables, using `lookup` to read them.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_APP_ID) {
            self.github.app_id = v;
        }
        if let Some(v) = get(ENV_INSTALLATION_ID) {
            self.github.installation_id = v;
        }
        if let Some(v) = get(ENV_API_URL) {
            self.github.api_base_url = v;
        }
        if let Some(v) = get(ENV_APP_KEY) {
            self.github.set_private_key(&v)?;
        }
        if let Some(v) = get(ENV_SOCKET_DIR) {
            self.sockets.directory = PathBuf::from(v);
        }
        Ok(())
    }

    /// Fail unless every GitHub App credential is present.
    pub fn require_credentials(&self) -> Result<(), ConfigError> {
        if self.github.app_id.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "github.app_id",
                env: ENV_APP_ID,
            });
        }
        if self.github.private_key.is_none() {
            return Err(ConfigError::MissingField {
                field: "github.private_key",
                env: ENV_APP_KEY,
            });
        }
        if self.github.installation_id.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "github.installation_id",
                env: ENV_INSTALLATION_ID,
            });
        }
        Ok(())
    }
}

fn load_env_files() {
    for path in [Path::new(".env"), Path::new(SYSTEM_ENV_FILE)] {
        match dotenvy::from_path(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "loaded environment file"),
            Err(e) if e.not_found() => {}
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable environment file")
            }
        }
    }
}
