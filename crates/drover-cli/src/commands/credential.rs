//! `drover credential` - git credential helper backed by the tenant socket.
//!
//! git runs the helper as `drover credential <get|store|erase>` and writes
//! the request attributes on stdin, terminated by a blank line or EOF. For
//! `get` we answer with an installation token; `store` and `erase` have
//! nothing to do since tokens are never persisted.
//!
//! Failing to reach the socket is not an error: the helper prints nothing,
//! and git falls through to its other helpers or prompts.

use clap::ValueEnum;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Where the tenant directory is mounted inside a container.
pub const DEFAULT_SOCKET: &str = "/var/run/drover/token.sock";

/// Username GitHub expects alongside an installation token.
const TOKEN_USERNAME: &str = "x-access-token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CredentialOp {
    Get,
    Store,
    Erase,
}

pub async fn credential(op: CredentialOp, socket: &Path) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    respond(op, socket, stdin, &mut stdout).await?;
    stdout.flush().await?;
    Ok(())
}

/// Handle one helper invocation, reading the request from `input` and
/// writing the answer to `output`.
pub async fn respond<R, W>(
    op: CredentialOp,
    socket: &Path,
    input: R,
    output: &mut W,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    drain_request(input).await?;

    if op != CredentialOp::Get {
        return Ok(());
    }

    match drover_socket::fetch_token(socket).await {
        Ok(token) => {
            let answer = format!("username={TOKEN_USERNAME}\npassword={}\n", token.trim());
            output.write_all(answer.as_bytes()).await
        }
        Err(e) => {
            tracing::debug!(socket = %socket.display(), error = %e, "no credentials available");
            Ok(())
        }
    }
}

async fn drain_request<R: AsyncBufRead + Unpin>(input: R) -> std::io::Result<()> {
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if line.is_empty() {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use drover_core::SocketConfig;
    use drover_socket::SocketManager;
    use drover_token::mock::{MockExchange, mock_provider};
    use std::sync::Arc;

    const REQUEST: &[u8] = b"protocol=https\nhost=github.com\n\n";

    async fn run(op: CredentialOp, socket: &Path) -> String {
        let mut out = Vec::new();
        respond(op, socket, REQUEST, &mut out).await.unwrap();
        String::from_utf8(out).unwrap()
    }

    async fn live_socket(dir: &Path, exchange: Arc<MockExchange>) -> (SocketManager, std::path::PathBuf) {
        let config = SocketConfig {
            directory: dir.to_path_buf(),
            ..SocketConfig::default()
        };
        let manager = SocketManager::new(config, Arc::new(mock_provider(exchange)));
        manager
            .create_endpoint("alpha", vec!["org/repoA".to_string()])
            .await
            .unwrap();
        let path = manager.socket_path("alpha");
        (manager, path)
    }

    #[tokio::test]
    async fn test_get_prints_token_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let exchange = Arc::new(MockExchange::new(Duration::hours(1)));
        let (_manager, socket) = live_socket(dir.path(), exchange).await;

        let out = run(CredentialOp::Get, &socket).await;

        assert_eq!(out, "username=x-access-token\npassword=ghs_mock_1_repoA\n");
    }

    #[tokio::test]
    async fn test_get_without_socket_prints_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = run(CredentialOp::Get, &dir.path().join("missing.sock")).await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_get_with_mint_failure_prints_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let exchange = Arc::new(MockExchange::new(Duration::hours(1)));
        exchange.fail_with(401);
        let (_manager, socket) = live_socket(dir.path(), exchange).await;

        let out = run(CredentialOp::Get, &socket).await;

        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_store_and_erase_are_noops() {
        let dir = tempfile::tempdir().unwrap();
        let exchange = Arc::new(MockExchange::new(Duration::hours(1)));
        let (_manager, socket) = live_socket(dir.path(), exchange.clone()).await;

        for op in [CredentialOp::Store, CredentialOp::Erase] {
            assert!(run(op, &socket).await.is_empty());
        }
        assert_eq!(exchange.calls(), 0);
    }
}
