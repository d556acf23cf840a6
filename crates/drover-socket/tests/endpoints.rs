//! Live tenant endpoints over real Unix sockets.

use chrono::Duration;
use drover_core::SocketConfig;
use drover_socket::{SocketError, SocketManager, client, fetch_token};
use drover_token::mock::{MockExchange, mock_provider};
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use tempfile::TempDir;

struct Harness {
    _dir: TempDir,
    exchange: Arc<MockExchange>,
    manager: SocketManager,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let exchange = Arc::new(MockExchange::new(Duration::hours(1)));
    let config = SocketConfig {
        directory: dir.path().join("sockets"),
        ..SocketConfig::default()
    };
    let manager = SocketManager::new(config, Arc::new(mock_provider(exchange.clone())));
    Harness {
        _dir: dir,
        exchange,
        manager,
    }
}

fn repos(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_endpoint_serves_scoped_token() {
    let h = harness();
    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();

    let path = h.manager.socket_path("alpha");
    assert!(path.ends_with("sockets/alpha/token.sock"));

    let token = fetch_token(&path).await.unwrap();
    assert_eq!(token, "ghs_mock_1_repoA");
    assert_eq!(h.exchange.last_repositories(), vec!["repoA"]);
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let h = harness();
    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();
    h.manager
        .create_endpoint("beta", repos(&["org/repoB", "org/repoC"]))
        .await
        .unwrap();

    let alpha = fetch_token(&h.manager.socket_path("alpha")).await.unwrap();
    let beta = fetch_token(&h.manager.socket_path("beta")).await.unwrap();

    assert!(alpha.ends_with("_repoA"));
    assert!(beta.ends_with("_repoB+repoC"));
    assert_ne!(alpha, beta);
}

#[tokio::test]
async fn test_create_is_idempotent_and_keeps_scope() {
    let h = harness();
    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();
    h.manager
        .create_endpoint("alpha", repos(&["org/repoB"]))
        .await
        .unwrap();

    assert_eq!(h.manager.tenants().await, vec!["alpha"]);
    assert_eq!(
        h.manager.scope_of("alpha").await,
        Some(repos(&["org/repoA"]))
    );

    let token = fetch_token(&h.manager.socket_path("alpha")).await.unwrap();
    assert!(token.ends_with("_repoA"));
}

#[tokio::test]
async fn test_remove_deletes_socket() {
    let h = harness();
    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();
    let path = h.manager.socket_path("alpha");
    assert!(path.exists());

    h.manager.remove_endpoint("alpha").await;

    assert!(!path.exists());
    assert!(h.manager.tenants().await.is_empty());
    assert!(fetch_token(&path).await.is_err());
}

#[tokio::test]
async fn test_remove_absent_and_repeated_is_noop() {
    let h = harness();
    h.manager.remove_endpoint("ghost").await;

    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();
    h.manager.remove_endpoint("alpha").await;
    h.manager.remove_endpoint("alpha").await;

    assert!(h.manager.tenants().await.is_empty());
}

#[tokio::test]
async fn test_remove_tolerates_externally_deleted_socket() {
    let h = harness();
    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();
    let path = h.manager.socket_path("alpha");
    std::fs::remove_file(&path).unwrap();

    h.manager.remove_endpoint("alpha").await;

    assert!(h.manager.tenants().await.is_empty());
}

#[tokio::test]
async fn test_stale_socket_file_is_replaced() {
    let h = harness();
    let path = h.manager.socket_path("alpha");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"left over from a crash").unwrap();

    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();

    let token = fetch_token(&path).await.unwrap();
    assert!(token.ends_with("_repoA"));
}

#[tokio::test]
async fn test_mint_failure_is_500_and_endpoint_survives() {
    let h = harness();
    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();
    let path = h.manager.socket_path("alpha");

    h.exchange.fail_with(401);
    let (status, body) = client::get(&path, "/token").await.unwrap();
    assert_eq!(status, 500);
    assert!(body.contains("401"));
    assert!(!body.contains("Bad credentials"));

    match fetch_token(&path).await {
        Err(SocketError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected status error, got {other:?}"),
    }

    h.exchange.succeed();
    let token = fetch_token(&path).await.unwrap();
    assert!(token.ends_with("_repoA"));
}

#[tokio::test]
async fn test_health_route_over_socket() {
    let h = harness();
    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();

    let (status, body) = client::get(&h.manager.socket_path("alpha"), "/health")
        .await
        .unwrap();
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
    assert_eq!(h.exchange.calls(), 0);
}

#[tokio::test]
async fn test_invalid_tenant_names_are_rejected() {
    let h = harness();
    for bad in ["", "..", "a/b"] {
        let err = h
            .manager
            .create_endpoint(bad, repos(&["org/repoA"]))
            .await
            .unwrap_err();
        assert!(matches!(err, SocketError::InvalidTenantName(_)));
    }
    assert!(h.manager.tenants().await.is_empty());
}

#[tokio::test]
async fn test_socket_and_directory_permissions() {
    let h = harness();
    h.manager.ensure_root_dir().unwrap();
    h.manager
        .create_endpoint("alpha", repos(&["org/repoA"]))
        .await
        .unwrap();

    let path = h.manager.socket_path("alpha");
    let socket_mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    let dir_mode = std::fs::metadata(path.parent().unwrap())
        .unwrap()
        .permissions()
        .mode()
        & 0o777;

    assert_eq!(socket_mode, 0o666);
    assert_eq!(dir_mode, 0o755);
}

#[tokio::test]
async fn test_shutdown_all_removes_everything() {
    let h = harness();
    for tenant in ["alpha", "beta", "gamma"] {
        h.manager
            .create_endpoint(tenant, repos(&["org/repoA"]))
            .await
            .unwrap();
    }
    assert_eq!(h.manager.tenants().await, vec!["alpha", "beta", "gamma"]);

    h.manager.shutdown_all().await;

    assert!(h.manager.tenants().await.is_empty());
    for tenant in ["alpha", "beta", "gamma"] {
        assert!(!h.manager.socket_path(tenant).exists());
    }
}
