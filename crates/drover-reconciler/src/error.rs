//! Error types for the reconciler.

use thiserror::Error;

/// Errors that stop reconciliation.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Querying the orchestrator failed.
    #[error("orchestrator request failed: {0}")]
    Orchestrator(String),

    /// The lifecycle event stream reported an error.
    #[error("event stream failed: {0}")]
    EventStream(String),

    /// The lifecycle event stream ended.
    #[error("event stream closed")]
    StreamClosed,
}
