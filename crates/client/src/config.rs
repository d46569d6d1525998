//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SWEET_SHOP_API_URL` - Base URL of the remote service (default: `http://localhost:8080/api`)
//! - `SWEET_SHOP_TIMEOUT_SECS` - Transport timeout in seconds (default: none)
//! - `SWEET_SHOP_SESSION_FILE` - Durable session file (default: `.sweet-shop-session.json`)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_SESSION_FILE: &str = ".sweet-shop-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every gateway path is appended to.
    pub api_url: Url,
    /// Transport timeout. `None` leaves requests unbounded.
    pub timeout: Option<Duration>,
    /// Where the session survives between runs.
    pub session_file: PathBuf,
}

impl ClientConfig {
    /// Configuration for a service at `api_url` with every other setting defaulted.
    #[must_use]
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: None,
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
        }
    }

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

        let api_url = parse_api_url(
            "SWEET_SHOP_API_URL",
            &get_env_or_default("SWEET_SHOP_API_URL", DEFAULT_API_URL),
        )?;

        let timeout = get_optional_env("SWEET_SHOP_TIMEOUT_SECS")
            .map(|raw| {
                raw.parse::<u64>().map(Duration::from_secs).map_err(|e| {
                    ConfigError::InvalidEnvVar("SWEET_SHOP_TIMEOUT_SECS".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let session_file =
            PathBuf::from(get_env_or_default("SWEET_SHOP_SESSION_FILE", DEFAULT_SESSION_FILE));

        Ok(Self {
            api_url,
            timeout,
            session_file,
        })
    }
}

/// Parse and check a base URL: it must be absolute http(s).
fn parse_api_url(name: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidEnvVar(
            name.to_string(),
            "base URL must not carry a query or fragment".to_string(),
        ));
    }

    Ok(url)
}

fn get_optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(name: &str, default: &str) -> String {
    get_optional_env(name).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_accepts_http_and_https() {
        assert!(parse_api_url("X", "http://localhost:8080/api").is_ok());
        assert!(parse_api_url("X", "https://shop.example.com/api/").is_ok());
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        let err = parse_api_url("SWEET_SHOP_API_URL", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(name, _) if name == "SWEET_SHOP_API_URL"));
    }

    #[test]
    fn test_parse_api_url_rejects_garbage() {
        assert!(parse_api_url("X", "not a url").is_err());
        assert!(parse_api_url("X", "http://localhost/api?x=1").is_err());
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = ClientConfig::new(Url::parse("http://127.0.0.1:9000").unwrap());
        assert_eq!(config.timeout, None);
        assert_eq!(config.session_file, PathBuf::from(DEFAULT_SESSION_FILE));
    }
}
