//! Registry of live tenant endpoints.

use crate::endpoint::TenantEndpoint;
use crate::error::SocketError;
use drover_core::{ScopeKey, SocketConfig};
use drover_token::TokenProvider;
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns one [`TenantEndpoint`] per tenant name.
///
/// A single lock serializes create, remove and shutdown, so the same tenant
/// can never be bound twice.
#[derive(Debug)]
pub struct SocketManager {
    config: SocketConfig,
    provider: Arc<TokenProvider>,
    endpoints: Mutex<HashMap<String, TenantEndpoint>>,
}

impl SocketManager {
    pub fn new(config: SocketConfig, provider: Arc<TokenProvider>) -> Self {
        Self {
            config,
            provider,
            endpoints: Mutex::new(HashMap::new()),
        }
    }

    /// Create the socket root directory (mode 0755) if it is missing.
    pub fn ensure_root_dir(&self) -> Result<(), SocketError> {
        let dir = &self.config.directory;
        let io_err = |source| SocketError::Io {
            path: dir.clone(),
            source,
        };
        fs::create_dir_all(dir).map_err(io_err)?;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).map_err(io_err)
    }

    /// Where the socket for `tenant` lives.
    pub fn socket_path(&self, tenant: &str) -> PathBuf {
        self.config
            .directory
            .join(tenant)
            .join(&self.config.socket_name)
    }

    /// Bind an endpoint for `tenant` serving tokens for `repos`.
    ///
    /// If the tenant already has a serving endpoint this returns `Ok` and
    /// leaves it untouched, including its scope. An endpoint whose server
    /// task has exited is replaced.
    pub async fn create_endpoint(&self, tenant: &str, repos: Vec<String>) -> Result<(), SocketError> {
        validate_tenant_name(tenant)?;

        let mut endpoints = self.endpoints.lock().await;
        match endpoints.remove(tenant) {
            Some(existing) if existing.is_serving() => {
                tracing::debug!(tenant, "endpoint already registered");
                endpoints.insert(tenant.to_string(), existing);
                return Ok(());
            }
            Some(dead) => {
                tracing::warn!(tenant, "replacing endpoint whose server has stopped");
                dead.close();
            }
            None => {}
        }

        let path = self.socket_path(tenant);
        let scope = ScopeKey::from_repos(&repos);
        let endpoint = TenantEndpoint::bind(tenant, repos, path, self.provider.clone())?;
        tracing::info!(
            tenant,
            path = %endpoint.path().display(),
            scope = %scope,
            "tenant endpoint created"
        );
        endpoints.insert(tenant.to_string(), endpoint);
        Ok(())
    }

    /// Stop serving `tenant` and delete its socket. No-op if absent.
    pub async fn remove_endpoint(&self, tenant: &str) {
        let mut endpoints = self.endpoints.lock().await;
        if let Some(endpoint) = endpoints.remove(tenant) {
            endpoint.close();
            tracing::info!(tenant, "tenant endpoint removed");
        }
    }

    /// Remove every registered endpoint.
    pub async fn shutdown_all(&self) {
        let mut endpoints = self.endpoints.lock().await;
        let count = endpoints.len();
        for (_, endpoint) in endpoints.drain() {
            endpoint.close();
        }
        tracing::info!(count, "all tenant endpoints shut down");
    }

    /// Names of tenants with a live endpoint, sorted.
    pub async fn tenants(&self) -> Vec<String> {
        let mut names: Vec<String> = self.endpoints.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// The repositories `tenant`'s endpoint was created with.
    pub async fn scope_of(&self, tenant: &str) -> Option<Vec<String>> {
        self.endpoints
            .lock()
            .await
            .get(tenant)
            .map(|endpoint| endpoint.repos().to_vec())
    }
}

/// Tenant names become a directory under the socket root.
fn validate_tenant_name(tenant: &str) -> Result<(), SocketError> {
    if tenant.is_empty() || tenant == "." || tenant == ".." || tenant.contains(['/', '\0']) {
        return Err(SocketError::InvalidTenantName(tenant.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tenant_name() {
        assert!(validate_tenant_name("alpha").is_ok());
        assert!(validate_tenant_name("drone-01.dev").is_ok());

        for bad in ["", ".", "..", "a/b", "../etc", "nul\0"] {
            assert!(
                matches!(
                    validate_tenant_name(bad),
                    Err(SocketError::InvalidTenantName(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
