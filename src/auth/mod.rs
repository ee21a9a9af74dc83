//! Authentication module
//!
//! Resolves an inbound request carrying a Connect JWT to a verified [`Tenant`]
//! or a typed [`AuthError`]. Tenant lookup and public key fetching are
//! collaborator traits so hosts can plug in their own persistence and trust
//! anchor.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub mod authenticator;
pub mod key_fetcher;
pub mod peek;

pub use authenticator::{ConnectAuthenticator, ConnectClaims};
pub use key_fetcher::CdnKeyFetcher;

/// Authentication errors
///
/// Display strings are machine-stable: callers and tests match on them, and
/// HTTP layers map them to client-visible 400/401 responses.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("No token parameter")]
    MissingToken,

    #[error("No integration found")]
    UnknownIssuer,

    #[error("Signature is invalid")]
    InvalidSignature,

    #[error("Unable to verify asymmetric installation JWT")]
    AsymmetricVerification,

    #[error("Query hash mismatch")]
    QueryHashMismatch,

    #[error("Unable to decode token: {0}")]
    Decode(String),

    #[error("Key fetch error: {0}")]
    KeyFetch(String),
}

/// Installation status of a tenant record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Active,
    Disabled,
}

/// The installing customer/organization identified by the token's `iss` claim.
///
/// Owned by the host's persistence layer; this crate only reads it. The
/// `shared_secret` is the symmetric key established during the installation
/// handshake and verifies HS256 tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub client_key: String,
    pub shared_secret: String,
    pub status: TenantStatus,
}

/// Authentication request context
///
/// Query pairs keep arrival order; repeated keys are legal and become
/// multi-valued entries in the query hash.
#[derive(Debug)]
pub struct AuthRequest {
    pub method: String,
    pub path: String,
    pub query_params: Vec<(String, String)>,
    pub headers: HashMap<String, String>,
}

impl AuthRequest {
    /// Extract the token from the request.
    ///
    /// Tries the `Authorization` header first (`JWT <token>` or
    /// `Bearer <token>`), then falls back to the `jwt` query parameter.
    pub fn token(&self) -> Option<&str> {
        if let Some(auth) = self.headers.get("authorization") {
            if let Some(token) = auth.strip_prefix("JWT ") {
                return Some(token);
            }
            if let Some(token) = auth.strip_prefix("Bearer ") {
                return Some(token);
            }
        }

        self.query_params
            .iter()
            .find(|(key, _)| key == "jwt")
            .map(|(_, value)| value.as_str())
    }
}

/// Tenant lookup by issuer
///
/// A key-value read against whatever persistence layer the host uses.
/// `Ok(None)` means no tenant is installed for that issuer.
#[async_trait]
pub trait TenantResolver: Send + Sync {
    async fn lookup(&self, issuer: &str) -> Result<Option<Tenant>, AuthError>;
}

/// Public key fetch by key ID
///
/// Returns PEM text from the configured trust anchor. A failure here must
/// surface as a verification failure, never an unauthenticated pass-through.
#[async_trait]
pub trait PublicKeyFetcher: Send + Sync {
    async fn fetch_public_key(&self, key_id: &str) -> Result<String, AuthError>;
}

/// In-memory tenant resolver backed by a map, keyed by issuer.
///
/// Useful for tests and single-tenant deployments.
#[derive(Debug, Default)]
pub struct StaticTenantResolver {
    tenants: HashMap<String, Tenant>,
}

impl StaticTenantResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tenant under its issuer key.
    pub fn insert(&mut self, tenant: Tenant) {
        self.tenants.insert(tenant.client_key.clone(), tenant);
    }
}

#[async_trait]
impl TenantResolver for StaticTenantResolver {
    async fn lookup(&self, issuer: &str) -> Result<Option<Tenant>, AuthError> {
        Ok(self.tenants.get(issuer).cloned())
    }
}
