//! Docker-backed [`Orchestrator`].

use crate::error::ReconcileError;
use crate::orchestrator::{EventReceiver, LifecycleEvent, Orchestrator, TenantContainer};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::ListContainersOptions;
use bollard::models::EventMessage;
use bollard::system::EventsOptions;
use chrono::Utc;
use drover_core::{OrchestratorConfig, parse_repos};
use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::mpsc;

const EVENT_BUFFER: usize = 64;

/// Reads tenant containers and their events from the local Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerOrchestrator {
    docker: Docker,
    labels: OrchestratorConfig,
}

impl DockerOrchestrator {
    /// Connect using the platform defaults (`DOCKER_HOST` or the local socket).
    pub fn connect(labels: OrchestratorConfig) -> Result<Self, ReconcileError> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| ReconcileError::Orchestrator(format!("connect to Docker: {e}")))?;
        Ok(Self::with_client(docker, labels))
    }

    pub fn with_client(docker: Docker, labels: OrchestratorConfig) -> Self {
        Self { docker, labels }
    }

    fn managed_filter(&self) -> String {
        format!("{}=true", self.labels.managed_label)
    }
}

#[async_trait]
impl Orchestrator for DockerOrchestrator {
    async fn list_tenants(&self) -> Result<Vec<TenantContainer>, ReconcileError> {
        let filters = HashMap::from([("label".to_string(), vec![self.managed_filter()])]);
        let containers = self
            .docker
            .list_containers(Some(ListContainersOptions {
                all: true,
                filters,
                ..Default::default()
            }))
            .await
            .map_err(|e| ReconcileError::Orchestrator(format!("list containers: {e}")))?;

        Ok(containers
            .into_iter()
            .filter_map(|c| {
                let labels = c.labels.unwrap_or_default();
                let tenant = tenant_container(
                    &self.labels,
                    &labels,
                    c.state.as_deref() == Some("running"),
                );
                if tenant.is_none() {
                    tracing::debug!(id = ?c.id, "managed container has no tenant label");
                }
                tenant
            })
            .collect())
    }

    async fn subscribe(&self) -> Result<EventReceiver, ReconcileError> {
        let filters = HashMap::from([
            ("type".to_string(), vec!["container".to_string()]),
            ("label".to_string(), vec![self.managed_filter()]),
        ]);
        // Docker only starts streaming once the task below connects; `since`
        // makes it replay anything emitted in between.
        let options = EventsOptions::<String> {
            since: Some(Utc::now()),
            filters,
            ..Default::default()
        };

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let docker = self.docker.clone();
        let labels = self.labels.clone();
        tokio::spawn(async move {
            let mut stream = Box::pin(docker.events(Some(options)));
            while let Some(item) = stream.next().await {
                let forwarded = match item {
                    Ok(message) => match lifecycle_event(&labels, &message) {
                        Some(event) => tx.send(Ok(event)).await,
                        None => continue,
                    },
                    Err(e) => {
                        let _ = tx.send(Err(ReconcileError::EventStream(e.to_string()))).await;
                        return;
                    }
                };
                if forwarded.is_err() {
                    return;
                }
            }
        });

        tracing::info!("watching Docker container events");
        Ok(rx)
    }
}

fn tenant_container(
    config: &OrchestratorConfig,
    labels: &HashMap<String, String>,
    running: bool,
) -> Option<TenantContainer> {
    let name = labels.get(&config.tenant_label).filter(|n| !n.is_empty())?;
    let repos = labels
        .get(&config.repo_label)
        .map(|r| parse_repos(r))
        .unwrap_or_default();
    Some(TenantContainer {
        name: name.clone(),
        repos,
        running,
    })
}

/// Map a Docker event to a lifecycle change, if it is one we act on.
fn lifecycle_event(config: &OrchestratorConfig, message: &EventMessage) -> Option<LifecycleEvent> {
    let attributes = message.actor.as_ref()?.attributes.as_ref()?;
    let tenant = attributes
        .get(&config.tenant_label)
        .filter(|n| !n.is_empty())?
        .clone();

    match message.action.as_deref()? {
        "start" => {
            let repos = attributes
                .get(&config.repo_label)
                .map(|r| parse_repos(r))
                .unwrap_or_default();
            Some(LifecycleEvent::Started { tenant, repos })
        }
        "stop" | "die" => Some(LifecycleEvent::Stopped { tenant }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::EventActor;

    fn message(action: &str, attrs: &[(&str, &str)]) -> EventMessage {
        EventMessage {
            action: Some(action.to_string()),
            actor: Some(EventActor {
                id: Some("c0ffee".to_string()),
                attributes: Some(
                    attrs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.to_string()))
                        .collect(),
                ),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_start_event_carries_scope() {
        let config = OrchestratorConfig::default();
        let event = lifecycle_event(
            &config,
            &message(
                "start",
                &[
                    ("drover.tenant", "beta"),
                    ("drover.repo", "org/repoB, org/repoC"),
                ],
            ),
        );

        assert_eq!(
            event,
            Some(LifecycleEvent::Started {
                tenant: "beta".to_string(),
                repos: vec!["org/repoB".to_string(), "org/repoC".to_string()],
            })
        );
    }

    #[test]
    fn test_stop_and_die_map_to_stopped() {
        let config = OrchestratorConfig::default();
        for action in ["stop", "die"] {
            let event = lifecycle_event(&config, &message(action, &[("drover.tenant", "alpha")]));
            assert_eq!(
                event,
                Some(LifecycleEvent::Stopped {
                    tenant: "alpha".to_string()
                })
            );
        }
    }

    #[test]
    fn test_irrelevant_events_are_ignored() {
        let config = OrchestratorConfig::default();
        assert_eq!(
            lifecycle_event(&config, &message("pause", &[("drover.tenant", "alpha")])),
            None
        );
        assert_eq!(
            lifecycle_event(&config, &message("start", &[("drover.repo", "org/repoA")])),
            None
        );
        assert_eq!(
            lifecycle_event(&config, &EventMessage::default()),
            None
        );
    }

    #[test]
    fn test_tenant_container_from_labels() {
        let config = OrchestratorConfig::default();
        let labels = HashMap::from([
            ("drover.tenant".to_string(), "alpha".to_string()),
            ("drover.repo".to_string(), "org/repoA".to_string()),
        ]);

        let tenant = tenant_container(&config, &labels, true).unwrap();
        assert_eq!(tenant.name, "alpha");
        assert_eq!(tenant.repos, vec!["org/repoA"]);
        assert!(tenant.running);

        assert!(tenant_container(&config, &HashMap::new(), true).is_none());
    }
}
