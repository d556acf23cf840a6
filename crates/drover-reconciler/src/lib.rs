//! # drover-reconciler
//!
//! Keeps tenant endpoints in step with the running tenant containers.
//!
//! On start the [`Reconciler`] asks the [`Orchestrator`] for every managed
//! container and creates an endpoint for each running one. It then follows
//! the orchestrator's lifecycle events:
//!
//! | Event   | Action                         |
//! |---------|--------------------------------|
//! | start   | create endpoint (labels scope) |
//! | stop    | remove endpoint                |
//! | die     | remove endpoint                |
//!
//! A broken event stream ends [`Reconciler::run`] with an error rather
//! than resubscribing.

pub mod docker;
pub mod error;
pub mod orchestrator;
pub mod reconciler;

pub use docker::DockerOrchestrator;
pub use error::ReconcileError;
pub use orchestrator::{EventReceiver, LifecycleEvent, Orchestrator, TenantContainer};
pub use reconciler::{Reconciler, RecoveryReport};
