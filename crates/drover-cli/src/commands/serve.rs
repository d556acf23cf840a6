//! `drover serve` - run the broker.

use anyhow::Context;
use drover_core::BrokerConfig;
use drover_reconciler::{DockerOrchestrator, ReconcileError, Reconciler};
use drover_socket::SocketManager;
use drover_token::TokenProvider;
use std::path::Path;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};

pub async fn serve(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = BrokerConfig::load(config_path).context("loading configuration")?;
    config
        .require_credentials()
        .context("missing GitHub App credentials")?;

    let provider = TokenProvider::from_config(&config.github).context("creating token provider")?;
    let sockets = Arc::new(SocketManager::new(config.sockets.clone(), Arc::new(provider)));
    sockets
        .ensure_root_dir()
        .context("creating socket directory")?;

    let orchestrator =
        DockerOrchestrator::connect(config.orchestrator.clone()).context("connecting to Docker")?;
    let reconciler = Reconciler::new(orchestrator, sockets.clone());

    tracing::info!(
        app_id = %config.github.app_id,
        installation_id = %config.github.installation_id,
        socket_dir = %config.sockets.directory.display(),
        "broker starting"
    );

    let outcome = tokio::select! {
        result = reconciler.run() => Some(result),
        signal = shutdown_signal() => {
            signal?;
            None
        }
    };

    sockets.shutdown_all().await;

    match outcome {
        None => {
            tracing::info!("broker stopped");
            Ok(())
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "reconciler stopped");
            Err(e).context("watching container events")
        }
        Some(Ok(())) => Err(ReconcileError::StreamClosed).context("watching container events"),
    }
}

/// Resolve on the first SIGINT or SIGTERM.
async fn shutdown_signal() -> anyhow::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
    };
    tracing::info!(signal = name, "shutting down");
    Ok(())
}
