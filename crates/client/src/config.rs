//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `LEVELUP_API_BASE_URL` - Backend root URL (default: `http://localhost:8080`)
//! - `LEVELUP_STORAGE_PATH` - Durable storage file (default: `.levelup/storage.json`)
//! - `LEVELUP_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_STORAGE_PATH: &str = ".levelup/storage.json";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend root URL.
    pub api_base_url: Url,
    /// File backing the session/cart storage.
    pub storage_path: PathBuf,
    /// Timeout applied to every HTTP request.
    pub http_timeout: Duration,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_base_url = non_empty(&lookup, "LEVELUP_API_BASE_URL");
        let api_base_url = Url::parse(raw_base_url.as_deref().unwrap_or(DEFAULT_API_BASE_URL))
            .map_err(|e| {
                ConfigError::InvalidEnvVar("LEVELUP_API_BASE_URL".to_string(), e.to_string())
            })?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "LEVELUP_API_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", api_base_url.scheme()),
            ));
        }

        let storage_path = non_empty(&lookup, "LEVELUP_STORAGE_PATH")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_PATH), PathBuf::from);

        let http_timeout = match non_empty(&lookup, "LEVELUP_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar(
                        "LEVELUP_HTTP_TIMEOUT_SECS".to_string(),
                        e.to_string(),
                    )
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidEnvVar(
                        "LEVELUP_HTTP_TIMEOUT_SECS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        Ok(Self {
            api_base_url,
            storage_path,
            http_timeout,
        })
    }
}

/// Get a variable, treating empty values as unset.
fn non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key).filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.storage_path, PathBuf::from(".levelup/storage.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("LEVELUP_API_BASE_URL", "https://api.levelup.cl/v1/"),
            ("LEVELUP_STORAGE_PATH", "/tmp/levelup.json"),
            ("LEVELUP_HTTP_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.api_base_url.as_str(), "https://api.levelup.cl/v1/");
        assert_eq!(config.storage_path, PathBuf::from("/tmp/levelup.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let config = load(&[("LEVELUP_STORAGE_PATH", "  ")]).unwrap();
        assert_eq!(config.storage_path, PathBuf::from(DEFAULT_STORAGE_PATH));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("LEVELUP_API_BASE_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(k, _)) if k == "LEVELUP_API_BASE_URL"
        ));
        assert!(load(&[("LEVELUP_API_BASE_URL", "ftp://x.cl")]).is_err());
        assert!(load(&[("LEVELUP_HTTP_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("LEVELUP_HTTP_TIMEOUT_SECS", "0")]).is_err());
    }
}
