//! Socket layout configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where per-tenant sockets are bound.
///
/// Each tenant gets `<directory>/<tenant>/<socket_name>`. The tenant
/// directory is what gets bind-mounted into the tenant's container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Root directory for tenant socket directories.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// File name of the socket inside each tenant directory.
    #[serde(default = "default_socket_name")]
    pub socket_name: String,
}

fn default_directory() -> PathBuf {
    PathBuf::from("/var/run/drover")
}

fn default_socket_name() -> String {
    "token.sock".to_string()
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            socket_name: default_socket_name(),
        }
    }
}
