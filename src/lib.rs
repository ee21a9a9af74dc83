//! Connect Authr Library
//!
//! Request authentication for Atlassian Connect style webhooks and lifecycle
//! events. An inbound HTTP request carrying a JWS-compact JWT is resolved to a
//! verified tenant identity, or rejected with a typed error.
//!
//! # Features
//!
//! - **Query-string hash**: canonical request digest binding a token to one
//!   request shape (method, path, query)
//! - **Shared-secret tokens**: HS256 verification against the tenant secret
//! - **Installation tokens**: RS256 verification against a public key fetched
//!   from a trusted CDN, selected by the token's `kid` header
//! - **Pluggable collaborators**: tenant lookup and key fetching are traits
//!
//! # Example
//!
//! ```no_run
//! use connect_authr::auth::{CdnKeyFetcher, ConnectAuthenticator, StaticTenantResolver};
//! use connect_authr::config::ConnectConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let resolver = StaticTenantResolver::new();
//! let config = ConnectConfig::load("config.yaml")?;
//! let fetcher = CdnKeyFetcher::from_config(&config)?;
//! let authenticator = ConnectAuthenticator::new(resolver, fetcher, &config.base_url);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod qsh;

// Re-export commonly used types
pub use auth::{AuthError, AuthRequest, ConnectAuthenticator, Tenant, TenantStatus};
pub use config::ConnectConfig;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
