//! Unverified token pre-read
//!
//! Decodes the claims segment of a JWS-compact token without checking the
//! signature. The result is typed [`UnverifiedClaims`], distinct from the
//! verified [`super::ConnectClaims`]: unverified fields select the tenant and
//! the verification strategy, they never gate authorization on their own.

use super::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

/// Claims read before signature verification.
///
/// Only `iss` is consumed (to look up the tenant's shared secret); everything
/// else is carried for diagnostics.
#[derive(Debug, Deserialize)]
pub struct UnverifiedClaims {
    pub iss: String,
    #[serde(default)]
    pub qsh: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

/// Decode the claims segment of `token` without verifying the signature.
///
/// Malformed base64 or JSON fails with [`AuthError::Decode`]; it is never
/// swallowed.
pub fn peek_claims(token: &str) -> Result<UnverifiedClaims, AuthError> {
    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_header), Some(payload), Some(_signature), None) => payload,
        _ => {
            return Err(AuthError::Decode(
                "token is not a three-segment JWS".into(),
            ))
        }
    };

    let body = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| AuthError::Decode(format!("claims segment: {}", e)))?;

    serde_json::from_slice(&body).map_err(|e| AuthError::Decode(format!("claims body: {}", e)))
}
