//! Drives the endpoint registry from orchestrator state.

use crate::error::ReconcileError;
use crate::orchestrator::{LifecycleEvent, Orchestrator};
use drover_socket::SocketManager;
use std::collections::HashSet;
use std::sync::Arc;

/// Outcome of a recovery pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoveryReport {
    /// Running tenants that have an endpoint after the pass.
    pub live: usize,
    /// Running tenants whose endpoint could not be bound.
    pub failed: usize,
    /// Registered tenants removed because they are no longer running.
    pub removed: usize,
}

/// Keeps the set of tenant endpoints equal to the set of running tenants.
///
/// No local state is consulted: recovery rebuilds everything from the
/// orchestrator, and create/remove are idempotent so duplicate events are
/// harmless.
pub struct Reconciler<O> {
    orchestrator: O,
    sockets: Arc<SocketManager>,
}

impl<O: Orchestrator> Reconciler<O> {
    pub fn new(orchestrator: O, sockets: Arc<SocketManager>) -> Self {
        Self {
            orchestrator,
            sockets,
        }
    }

    pub fn sockets(&self) -> &Arc<SocketManager> {
        &self.sockets
    }

    /// Create endpoints for every running tenant and drop any for tenants
    /// that are not running.
    pub async fn recover(&self) -> Result<RecoveryReport, ReconcileError> {
        let containers = self.orchestrator.list_tenants().await?;
        let mut report = RecoveryReport::default();
        let mut running = HashSet::new();

        for container in containers.into_iter().filter(|c| c.running) {
            running.insert(container.name.clone());
            match self
                .sockets
                .create_endpoint(&container.name, container.repos)
                .await
            {
                Ok(()) => report.live += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(tenant = %container.name, error = %e, "failed to recover tenant endpoint");
                }
            }
        }

        for tenant in self.sockets.tenants().await {
            if !running.contains(&tenant) {
                self.sockets.remove_endpoint(&tenant).await;
                report.removed += 1;
            }
        }

        tracing::info!(
            live = report.live,
            failed = report.failed,
            removed = report.removed,
            "recovery complete"
        );
        Ok(report)
    }

    /// Apply one lifecycle event.
    ///
    /// A bind failure is logged and leaves the tenant without an endpoint;
    /// the next start event for it retries.
    pub async fn apply(&self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Started { tenant, repos } => {
                if let Err(e) = self.sockets.create_endpoint(&tenant, repos).await {
                    tracing::warn!(tenant = %tenant, error = %e, "failed to create tenant endpoint");
                }
            }
            LifecycleEvent::Stopped { tenant } => {
                self.sockets.remove_endpoint(&tenant).await;
            }
        }
    }

    /// Recover, then follow lifecycle events until the stream fails.
    ///
    /// The subscription is opened before the recovery pass so that changes
    /// made while containers are being listed are queued and applied
    /// afterwards.
    ///
    /// Never returns `Ok`: the event stream ending is an error, and the
    /// caller is expected to exit so a supervisor can restart the broker.
    /// A failed recovery pass is logged and does not stop the loop.
    pub async fn run(&self) -> Result<(), ReconcileError> {
        let mut events = self.orchestrator.subscribe().await?;

        if let Err(e) = self.recover().await {
            tracing::warn!(error = %e, "recovery failed, continuing with live events");
        }

        while let Some(item) = events.recv().await {
            let event = item?;
            tracing::debug!(tenant = event.tenant(), event = ?event, "lifecycle event");
            self.apply(event).await;
        }

        Err(ReconcileError::StreamClosed)
    }
}
