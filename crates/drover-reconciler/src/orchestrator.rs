//! The container orchestrator as seen by the reconciler.

use crate::error::ReconcileError;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A managed tenant container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContainer {
    /// Tenant name, from the tenant label.
    pub name: String,
    /// Repository scope, parsed from the repo label.
    pub repos: Vec<String>,
    pub running: bool,
}

/// A lifecycle change of a managed container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The container started and should get an endpoint for `repos`.
    Started { tenant: String, repos: Vec<String> },
    /// The container stopped or died.
    Stopped { tenant: String },
}

impl LifecycleEvent {
    pub fn tenant(&self) -> &str {
        match self {
            Self::Started { tenant, .. } | Self::Stopped { tenant } => tenant,
        }
    }
}

/// Items delivered on an event subscription.
pub type EventReceiver = mpsc::Receiver<Result<LifecycleEvent, ReconcileError>>;

/// Source of truth for which tenants are running.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Every managed container, running or not.
    async fn list_tenants(&self) -> Result<Vec<TenantContainer>, ReconcileError>;

    /// Start delivering lifecycle events for managed containers.
    ///
    /// The receiver yields an `Err` and then closes if the underlying
    /// stream breaks.
    async fn subscribe(&self) -> Result<EventReceiver, ReconcileError>;
}
