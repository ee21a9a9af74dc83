//! CDN public key fetching
//!
//! Installation lifecycle tokens are signed asymmetrically; the matching
//! public key is published by the issuing party on a fixed CDN, addressed by
//! the token's `kid` header. Fetched keys are cached with a TTL so repeated
//! lifecycle events do not refetch.
//!
//! # Example
//!
//! ```no_run
//! use connect_authr::auth::CdnKeyFetcher;
//! use std::time::Duration;
//!
//! let fetcher = CdnKeyFetcher::new("https://connect-install-keys.atlassian.com")
//!     .with_cache_ttl(Duration::from_secs(3600));
//! ```

use super::{AuthError, PublicKeyFetcher};
use crate::config::ConnectConfig;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default trust anchor host publishing installation keys.
pub const DEFAULT_TRUST_ANCHOR: &str = "https://connect-install-keys.atlassian.com";

struct CachedKey {
    pem: String,
    fetched_at: Instant,
}

/// Public key fetcher backed by the trust-anchor CDN.
///
/// Keys are fetched with `GET {base_url}/{key_id}` and cached per key ID.
pub struct CdnKeyFetcher {
    base_url: String,
    client: reqwest::Client,
    cache: RwLock<HashMap<String, CachedKey>>,
    cache_ttl: Duration,
}

impl CdnKeyFetcher {
    /// Create a fetcher against the given trust-anchor base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            cache: RwLock::new(HashMap::new()),
            cache_ttl: Duration::from_secs(3600), // Default: 1 hour
        }
    }

    /// Create a fetcher from configuration, applying the HTTP timeout.
    pub fn from_config(config: &ConnectConfig) -> Result<Self, AuthError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .build()
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        Ok(Self {
            base_url: config.key_cdn_url.trim_end_matches('/').to_string(),
            client,
            cache: RwLock::new(HashMap::new()),
            cache_ttl: Duration::from_secs(3600),
        })
    }

    /// Set the cache TTL
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the cache TTL
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    async fn fetch_remote(&self, key_id: &str) -> Result<String, AuthError> {
        let url = format!("{}/{}", self.base_url, key_id);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetch(format!(
                "HTTP {}: {}",
                response.status(),
                response.status().canonical_reason().unwrap_or("Unknown")
            )));
        }

        response
            .text()
            .await
            .map_err(|e| AuthError::KeyFetch(e.to_string()))
    }
}

#[async_trait]
impl PublicKeyFetcher for CdnKeyFetcher {
    async fn fetch_public_key(&self, key_id: &str) -> Result<String, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(hit) = cache.get(key_id) {
                if hit.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(hit.pem.clone());
                }
            }
        }

        let pem = self.fetch_remote(key_id).await?;
        tracing::debug!(kid = %key_id, "fetched installation public key");

        let mut cache = self.cache.write().await;
        cache.insert(
            key_id.to_string(),
            CachedKey {
                pem: pem.clone(),
                fetched_at: Instant::now(),
            },
        );

        Ok(pem)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let fetcher = CdnKeyFetcher::new("https://keys.example.com/");
        assert_eq!(fetcher.base_url, "https://keys.example.com");
    }

    #[test]
    fn test_default_cache_ttl() {
        let fetcher = CdnKeyFetcher::new(DEFAULT_TRUST_ANCHOR);
        assert_eq!(fetcher.cache_ttl(), Duration::from_secs(3600));

        let fetcher = fetcher.with_cache_ttl(Duration::from_secs(300));
        assert_eq!(fetcher.cache_ttl(), Duration::from_secs(300));
    }
}
