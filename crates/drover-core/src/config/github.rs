//! GitHub App configuration.

use crate::error::ConfigError;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Credentials and upstream settings for the GitHub App.
#[derive(Debug, Serialize, Deserialize)]
pub struct GitHubAppConfig {
    /// App identifier, used as the JWT issuer.
    #[serde(default)]
    pub app_id: String,

    /// Installation identifier the access tokens are minted against.
    #[serde(default)]
    pub installation_id: String,

    /// Path to the PEM-encoded private key.
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// Base URL of the GitHub REST API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Timeout for the token exchange request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Resolved private key material. Only ever populated from the
    /// environment or `private_key_file`.
    #[serde(skip)]
    pub private_key: Option<SecretString>,
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for GitHubAppConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            installation_id: String::new(),
            private_key_file: None,
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            private_key: None,
        }
    }
}

impl GitHubAppConfig {
    /// Set the private key from a raw value.
    ///
    /// A value starting with `/` is a path to the PEM file rather than the
    /// PEM itself.
    pub fn set_private_key(&mut self, value: &str) -> Result<(), ConfigError> {
        if value.starts_with('/') {
            self.private_key = Some(read_key_file(Path::new(value))?);
        } else {
            self.private_key = Some(SecretString::from(value.to_string()));
        }
        Ok(())
    }

    /// Read `private_key_file`, if one is configured.
    pub fn load_private_key_file(&mut self) -> Result<(), ConfigError> {
        if let Some(path) = &self.private_key_file {
            self.private_key = Some(read_key_file(path)?);
        }
        Ok(())
    }

    /// Timeout for the token exchange request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn read_key_file(path: &Path) -> Result<SecretString, ConfigError> {
    let pem = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(SecretString::from(pem))
}
