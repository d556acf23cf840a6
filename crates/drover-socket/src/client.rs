//! Minimal HTTP/1 client for a tenant socket.
//!
//! This is what runs inside a tenant's container (via `drover credential`)
//! and what the integration tests use to talk to live endpoints.

use crate::endpoint::TOKEN_PATH;
use crate::error::SocketError;
use http_body_util::{BodyExt, Empty};
use hyper::Request;
use hyper::body::Bytes;
use hyper_util::rt::TokioIo;
use std::path::Path;
use tokio::net::UnixStream;

/// Issue `GET uri` over the socket at `path`.
///
/// Returns the status code and the body as text.
pub async fn get(path: &Path, uri: &str) -> Result<(u16, String), SocketError> {
    let client_err = |message: String| SocketError::Client {
        path: path.to_path_buf(),
        message,
    };

    let stream = UnixStream::connect(path)
        .await
        .map_err(|e| client_err(format!("connect: {e}")))?;
    let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
        .await
        .map_err(|e| client_err(format!("handshake: {e}")))?;
    tokio::spawn(async move {
        if let Err(e) = conn.await {
            tracing::debug!(error = %e, "socket connection closed with error");
        }
    });

    let request = Request::builder()
        .uri(uri)
        .header(hyper::header::HOST, "localhost")
        .body(Empty::<Bytes>::new())
        .map_err(|e| client_err(format!("request: {e}")))?;

    let response = sender
        .send_request(request)
        .await
        .map_err(|e| client_err(format!("send: {e}")))?;
    let status = response.status().as_u16();
    let body = response
        .into_body()
        .collect()
        .await
        .map_err(|e| client_err(format!("read body: {e}")))?
        .to_bytes();

    Ok((status, String::from_utf8_lossy(&body).into_owned()))
}

/// Fetch a token from the tenant socket at `path`.
pub async fn fetch_token(path: &Path) -> Result<String, SocketError> {
    let (status, body) = get(path, TOKEN_PATH).await?;
    if status != 200 {
        return Err(SocketError::Status { status, body });
    }
    Ok(body)
}
