//! Configuration module
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.

use crate::auth::key_fetcher::DEFAULT_TRUST_ANCHOR;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
fn expand_env_vars(s: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}").unwrap();
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let full_match = cap.get(0).unwrap();
        let var_name = cap.get(1).unwrap().as_str();

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name) {
            Ok(val) => val,
            Err(_) => {
                if let Some(default) = cap.get(2) {
                    default.as_str().to_string()
                } else {
                    // No env var and no default. Keep the original placeholder.
                    full_match.as_str().to_string()
                }
            }
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Custom deserializer for strings with environment variable expansion.
fn deserialize_with_env<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Ok(expand_env_vars(&s))
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
///
/// # Example
///
/// ```yaml
/// base_url: "${BASE_URL:-https://connect.example.com}"
/// key_cdn_url: "https://connect-install-keys.atlassian.com"
/// http_timeout_seconds: 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// This service's externally visible base URL. Installation tokens must
    /// carry it as their `aud` claim. Supports ${VAR} expansion.
    #[serde(deserialize_with = "deserialize_with_env")]
    pub base_url: String,

    /// Trust-anchor host publishing installation public keys.
    /// Supports ${VAR} expansion.
    #[serde(
        default = "default_key_cdn_url",
        deserialize_with = "deserialize_with_env"
    )]
    pub key_cdn_url: String,

    /// Timeout applied to key-fetch HTTP calls, in seconds. Default: 10
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

fn default_key_cdn_url() -> String {
    DEFAULT_TRUST_ANCHOR.to_string()
}

fn default_http_timeout() -> u64 {
    10
}

impl ConnectConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.base_url) {
            return Err(ConfigError::ValidationError(
                "Invalid base_url: must start with http:// or https://".into(),
            ));
        }

        if !is_valid_http_url(&self.key_cdn_url) {
            return Err(ConfigError::ValidationError(
                "Invalid key_cdn_url: must start with http:// or https://".into(),
            ));
        }

        if self.http_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "http_timeout_seconds must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars_with_default() {
        let result = expand_env_vars("${DEFINITELY_NOT_SET_ABC:-fallback}");
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_expand_env_vars_keeps_unknown_placeholder() {
        let result = expand_env_vars("prefix-${DEFINITELY_NOT_SET_ABC}-suffix");
        assert_eq!(result, "prefix-${DEFINITELY_NOT_SET_ABC}-suffix");
    }

    #[test]
    fn test_defaults_applied() {
        let config: ConnectConfig =
            serde_yaml::from_str("base_url: https://connect.example.com").unwrap();
        assert_eq!(config.key_cdn_url, DEFAULT_TRUST_ANCHOR);
        assert_eq!(config.http_timeout_seconds, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_base_url() {
        let config = ConnectConfig {
            base_url: "ftp://connect.example.com".into(),
            key_cdn_url: DEFAULT_TRUST_ANCHOR.into(),
            http_timeout_seconds: 10,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let config = ConnectConfig {
            base_url: "https://connect.example.com".into(),
            key_cdn_url: DEFAULT_TRUST_ANCHOR.into(),
            http_timeout_seconds: 0,
        };
        assert!(config.validate().is_err());
    }
}
