//! Orchestrator label configuration.

use serde::{Deserialize, Serialize};

/// Labels that identify tenant containers and carry their scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Label set to `true` on every container the broker manages.
    #[serde(default = "default_managed_label")]
    pub managed_label: String,

    /// Label holding the tenant name.
    #[serde(default = "default_tenant_label")]
    pub tenant_label: String,

    /// Label holding the comma-separated repository scope.
    #[serde(default = "default_repo_label")]
    pub repo_label: String,
}

fn default_managed_label() -> String {
    "drover.managed".to_string()
}

fn default_tenant_label() -> String {
    "drover.tenant".to_string()
}

fn default_repo_label() -> String {
    "drover.repo".to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            managed_label: default_managed_label(),
            tenant_label: default_tenant_label(),
            repo_label: default_repo_label(),
        }
    }
}
