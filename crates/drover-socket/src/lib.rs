//! # drover-socket
//!
//! One isolated credential endpoint per tenant.
//!
//! Each tenant gets an HTTP server bound to its own Unix socket,
//! `<root>/<tenant>/token.sock`. The tenant directory is bind-mounted into
//! that tenant's container and nowhere else, so being able to reach the
//! socket is the authorization. The endpoint serves one operation:
//!
//! ```text
//! GET /token  → 200 text/plain <installation token for the tenant's scope>
//!             → 500 <error> when minting fails
//! ```
//!
//! [`SocketManager`] owns the live endpoints, keyed by tenant name.
//! Creating and removing endpoints are both idempotent.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod manager;

pub use client::fetch_token;
pub use endpoint::{TOKEN_PATH, TenantEndpoint};
pub use error::SocketError;
pub use manager::SocketManager;
