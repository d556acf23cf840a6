//! # drover-token
//!
//! Turns the GitHub App's long-lived private key into short-lived,
//! repository-scoped installation access tokens.
//!
//! ```text
//! TokenProvider::get_token(repos)
//!     │
//!     ├─ cache hit with > 5 min left ──────────────► cached AccessToken
//!     │
//!     └─ miss / near expiry
//!          │
//!          ├─ Minter::mint()            RS256 app JWT, 10 min lifetime
//!          └─ TokenExchange::exchange() POST /app/installations/{id}/access_tokens
//!                                       └─► AccessToken, cached per ScopeKey
//! ```
//!
//! The cache lives inside one [`TokenProvider`] value; nothing is written to
//! disk and failed exchanges are never cached.

pub mod error;
pub mod exchange;
pub mod minter;
pub mod provider;

pub mod mock;

pub use error::TokenError;
pub use exchange::{GitHubExchange, TokenExchange};
pub use minter::{Minter, SignedAssertion};
pub use provider::{AccessToken, CachedToken, REFRESH_MARGIN_SECS, TokenProvider};
