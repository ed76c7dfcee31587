//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SHOP_API_BASE_URL` - Base URL of the REST controllers
//!   (default: `http://localhost/template-shop/api`)
//! - `SHOP_STORAGE_DIR` - Directory for the durable local key-value layer
//!   (default: `.shop-storage`)
//! - `SHOP_API_TIMEOUT_SECS` - Per-request timeout; unset means requests may
//!   wait indefinitely
//! - `SHOP_CONTENT_POLICY` - `trusted` (default) or `sanitized`
//! - `SHOP_API_TOKEN` - Bearer token seeded into local storage when none is
//!   stored yet

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::content::ContentPolicy;

const DEFAULT_API_BASE_URL: &str = "http://localhost/template-shop/api";
const DEFAULT_STORAGE_DIR: &str = ".shop-storage";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Remote API settings
    pub api: ApiConfig,
    /// Directory backing the durable local key-value layer
    pub storage_dir: PathBuf,
    /// How blog HTML is treated when rendered
    pub content_policy: ContentPolicy,
}

/// Remote API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL; entity endpoints are joined onto it
    pub base_url: Url,
    /// Optional request timeout
    pub timeout: Option<Duration>,
    /// Token used when local storage has none
    pub token: Option<SecretString>,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ApiConfig {
    /// API configuration pointing at `base_url` with no timeout or token.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL does not parse.
    pub fn for_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("SHOP_API_BASE_URL", base_url)?,
            timeout: None,
            token: None,
        })
    }
}

impl ShopConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup("SHOP_API_BASE_URL").unwrap_or_else(|| DEFAULT_API_BASE_URL.into());
        let base_url = parse_base_url("SHOP_API_BASE_URL", &base_url)?;

        let timeout = lookup("SHOP_API_TIMEOUT_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| {
                        ConfigError::InvalidEnvVar("SHOP_API_TIMEOUT_SECS".to_string(), e.to_string())
                    })
            })
            .transpose()?;

        let content_policy = lookup("SHOP_CONTENT_POLICY")
            .map(|raw| {
                raw.parse::<ContentPolicy>()
                    .map_err(|e| ConfigError::InvalidEnvVar("SHOP_CONTENT_POLICY".to_string(), e))
            })
            .transpose()?
            .unwrap_or_default();

        let storage_dir = lookup("SHOP_STORAGE_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR), PathBuf::from);

        let token = lookup("SHOP_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout,
                token,
            },
            storage_dir,
            content_policy,
        })
    }
}

/// Parse a base URL, forcing a trailing slash so `Url::join` appends
/// endpoints instead of replacing the last path segment.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut normalized = raw.trim().to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    Url::parse(&normalized).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}
