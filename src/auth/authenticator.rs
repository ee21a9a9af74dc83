//! Connect JWT Authentication
//!
//! Orchestrates token extraction, unverified pre-read, tenant resolution,
//! signature verification, and query-hash checking. Two verification paths
//! exist, selected by the token's `kid` header:
//!
//! - no `kid`: a standard tenant request, HS256 against the tenant's shared
//!   secret
//! - `kid` present: an install/uninstall lifecycle event, RS256 against a
//!   public key fetched from the trusted CDN
//!
//! Both paths cryptographically verify before anything in the token is
//! trusted, and both end with the query-hash comparison that binds the token
//! to the live request.

use super::{peek, AuthError, AuthRequest, PublicKeyFetcher, Tenant, TenantResolver};
use crate::qsh;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Claims of a token whose signature has been verified.
///
/// Produced only by [`jsonwebtoken::decode`]; the `qsh` field is the one
/// claim that gates the final authentication decision.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectClaims {
    pub iss: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qsh: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// How the token's signature will be checked. Selected once from the
/// unverified header, used once, never mutated.
enum VerificationStrategy {
    SharedSecret,
    AsymmetricCdn { kid: String },
}

/// Connect JWT Authenticator
///
/// # Example
///
/// ```no_run
/// use connect_authr::auth::{CdnKeyFetcher, ConnectAuthenticator, StaticTenantResolver};
///
/// let resolver = StaticTenantResolver::new();
/// let fetcher = CdnKeyFetcher::new("https://connect-install-keys.atlassian.com");
/// let auth = ConnectAuthenticator::new(resolver, fetcher, "https://connect.example.com");
/// ```
pub struct ConnectAuthenticator<R, K> {
    resolver: R,
    key_fetcher: K,
    /// This service's externally visible base URL, the required `aud` for
    /// asymmetric installation tokens.
    base_url: String,
}

impl<R, K> ConnectAuthenticator<R, K>
where
    R: TenantResolver,
    K: PublicKeyFetcher,
{
    pub fn new(resolver: R, key_fetcher: K, base_url: &str) -> Self {
        Self {
            resolver,
            key_fetcher,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Authenticate a request, returning the verified tenant.
    ///
    /// All-or-nothing: any failure is a typed [`AuthError`] raised at the
    /// point of detection, with no retries and no partial state. The calling
    /// HTTP layer maps errors to 400/401 responses.
    #[tracing::instrument(
        name = "auth.connect",
        skip(self, request),
        fields(
            http.method = %request.method,
            http.path = %request.path,
        ),
        err
    )]
    pub async fn authenticate(&self, request: &AuthRequest) -> Result<Tenant, AuthError> {
        let token = request.token().ok_or(AuthError::MissingToken)?;

        // Unverified pre-read: selects the tenant and the strategy, nothing
        // else. Verification below re-reads the claims cryptographically.
        let header = decode_header(token).map_err(|e| AuthError::Decode(e.to_string()))?;
        let unverified = peek::peek_claims(token)?;

        let tenant = self
            .resolver
            .lookup(&unverified.iss)
            .await?
            .ok_or(AuthError::UnknownIssuer)?;

        let strategy = match header.kid.clone() {
            Some(kid) => VerificationStrategy::AsymmetricCdn { kid },
            None => VerificationStrategy::SharedSecret,
        };

        let claims = match strategy {
            VerificationStrategy::SharedSecret => self.verify_shared_secret(token, &tenant)?,
            VerificationStrategy::AsymmetricCdn { kid } => {
                self.verify_asymmetric(token, &header, &kid).await?
            }
        };

        let expected = qsh::compute_query_hash(
            &request.path,
            &request.method,
            request
                .query_params
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str())),
        );
        match claims.qsh.as_deref() {
            Some(qsh) if qsh == expected => {}
            _ => return Err(AuthError::QueryHashMismatch),
        }

        tracing::debug!(issuer = %tenant.client_key, "connect JWT verified");

        Ok(tenant)
    }

    /// HS256 verification against the tenant's shared secret.
    ///
    /// `aud` validation stays off here: the issuing side does not reliably set
    /// `aud` on symmetric tokens, and requiring it would reject legitimate
    /// callers.
    fn verify_shared_secret(
        &self,
        token: &str,
        tenant: &Tenant,
    ) -> Result<ConnectClaims, AuthError> {
        let decoding_key = DecodingKey::from_secret(tenant.shared_secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims::<&str>(&[]);
        validation.validate_exp = true;
        validation.validate_aud = false;

        decode::<ConnectClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::Decode(e.to_string()),
            })
    }

    /// RS256-family verification for installation lifecycle tokens.
    ///
    /// The public key comes from the trusted CDN, selected by the token's own
    /// `kid`, and the `aud` claim must equal this service's base URL.
    async fn verify_asymmetric(
        &self,
        token: &str,
        header: &Header,
        kid: &str,
    ) -> Result<ConnectClaims, AuthError> {
        let pem = self.key_fetcher.fetch_public_key(kid).await.map_err(|e| {
            tracing::debug!(kid = %kid, error = %e, "installation key fetch failed");
            AuthError::AsymmetricVerification
        })?;
        if pem.trim().is_empty() {
            return Err(AuthError::AsymmetricVerification);
        }

        let decoding_key = DecodingKey::from_rsa_pem(pem.as_bytes())
            .map_err(|_| AuthError::AsymmetricVerification)?;

        let algorithm = match header.alg {
            Algorithm::RS256 => Algorithm::RS256,
            Algorithm::RS384 => Algorithm::RS384,
            Algorithm::RS512 => Algorithm::RS512,
            _ => return Err(AuthError::AsymmetricVerification),
        };

        let mut validation = Validation::new(algorithm);
        validation.set_required_spec_claims::<&str>(&[]);
        validation.validate_exp = true;
        validation.set_audience(&[&self.base_url]);
        validation.validate_aud = true;

        decode::<ConnectClaims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => AuthError::AsymmetricVerification,
            })
    }
}
