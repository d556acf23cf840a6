//! A single tenant's token endpoint.

use crate::error::SocketError;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use drover_token::{TokenError, TokenProvider};
use std::fs;
use std::io::ErrorKind;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

/// Route serving the tenant's token.
pub const TOKEN_PATH: &str = "/token";

/// Any local process may connect; which mount namespace can see the
/// socket is the access boundary.
const SOCKET_MODE: u32 = 0o666;

/// Tenant directories must not be writable beyond the broker.
const TENANT_DIR_MODE: u32 = 0o755;

#[derive(Clone)]
struct EndpointState {
    tenant: Arc<str>,
    repos: Arc<[String]>,
    provider: Arc<TokenProvider>,
}

/// A failed mint, reported to the caller as a 500.
///
/// Upstream response bodies stay in the broker log; the tenant only sees
/// the upstream status.
struct MintFailure(TokenError);

impl IntoResponse for MintFailure {
    fn into_response(self) -> Response {
        let body = match self.0 {
            TokenError::Upstream { status, .. } => {
                format!("token unavailable: upstream returned {status}")
            }
            TokenError::Signing(_) => "token unavailable: signing failed".to_string(),
            TokenError::Request(_) | TokenError::InvalidResponse(_) => {
                "token unavailable: upstream unreachable".to_string()
            }
        };
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Build the HTTP routes served on a tenant socket.
///
/// The scope is captured here and cannot change for the lifetime of the
/// router.
pub fn router(tenant: &str, repos: Vec<String>, provider: Arc<TokenProvider>) -> Router {
    let state = EndpointState {
        tenant: Arc::from(tenant),
        repos: Arc::from(repos),
        provider,
    };

    Router::new()
        .route(TOKEN_PATH, get(get_token))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn get_token(State(state): State<EndpointState>) -> Result<Response, MintFailure> {
    match state.provider.get_token(&state.repos).await {
        Ok(token) => Ok((
            [(header::CONTENT_TYPE, "text/plain")],
            token.secret().to_string(),
        )
            .into_response()),
        Err(e) => {
            tracing::warn!(tenant = %state.tenant, error = %e, "token request failed");
            Err(MintFailure(e))
        }
    }
}

async fn health() -> &'static str {
    "ok"
}

/// A bound tenant socket and the server task behind it.
#[derive(Debug)]
pub struct TenantEndpoint {
    tenant: String,
    repos: Vec<String>,
    path: PathBuf,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl TenantEndpoint {
    /// Bind `path` and start serving tokens for `repos`.
    ///
    /// Creates the parent directory if needed and replaces any socket file
    /// left behind by a previous broker process. Must be called from within
    /// a Tokio runtime.
    pub fn bind(
        tenant: &str,
        repos: Vec<String>,
        path: PathBuf,
        provider: Arc<TokenProvider>,
    ) -> Result<Self, SocketError> {
        if let Some(dir) = path.parent() {
            prepare_dir(dir)?;
        }
        remove_stale(&path)?;

        let listener = UnixListener::bind(&path).map_err(|source| SocketError::Bind {
            path: path.clone(),
            source,
        })?;

        if let Err(source) = fs::set_permissions(&path, fs::Permissions::from_mode(SOCKET_MODE)) {
            drop(listener);
            let _ = fs::remove_file(&path);
            return Err(SocketError::Bind { path, source });
        }

        let app = router(tenant, repos.clone(), provider);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let name = tenant.to_string();
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(tenant = %name, error = %e, "tenant socket server failed");
            }
        });

        Ok(Self {
            tenant: tenant.to_string(),
            repos,
            path,
            shutdown: Some(shutdown_tx),
            task,
        })
    }

    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Repositories this endpoint serves tokens for.
    pub fn repos(&self) -> &[String] {
        &self.repos
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the server task is still running.
    pub fn is_serving(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop accepting connections and delete the socket file.
    ///
    /// In-flight requests may be cut short. A socket file that has already
    /// been removed is not an error.
    pub fn close(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(tenant = %self.tenant, path = %self.path.display(), error = %e, "failed to remove socket file")
            }
        }
    }
}

fn prepare_dir(dir: &Path) -> Result<(), SocketError> {
    let io_err = |source| SocketError::Io {
        path: dir.to_path_buf(),
        source,
    };
    fs::create_dir_all(dir).map_err(io_err)?;
    fs::set_permissions(dir, fs::Permissions::from_mode(TENANT_DIR_MODE)).map_err(io_err)
}

fn remove_stale(path: &Path) -> Result<(), SocketError> {
    match fs::remove_file(path) {
        Ok(()) => {
            tracing::debug!(path = %path.display(), "removed stale socket");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SocketError::Bind {
            path: path.to_path_buf(),
            source,
        }),
    }
}
