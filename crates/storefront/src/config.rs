//! State layer configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `STOREFRONT_DATA_DIR` - Directory backing durable storage (default: .storefront)
//! - `CATALOG_API_URL` - Catalog REST API base URL; enables image lookup
//! - `CATALOG_API_TOKEN` - Bearer token for the catalog API
//! - `IMAGE_CACHE_TTL_SECS` - Image lookup cache TTL in seconds (default: 300)
//! - `IMAGE_LOOKUP_TIMEOUT_SECS` - Image lookup request timeout in seconds (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// State layer configuration.
#[derive(Debug, Clone)]
pub struct StateConfig {
    /// Directory backing durable key-value storage
    pub data_dir: PathBuf,
    /// Catalog API configuration, `None` disables image lookup
    pub catalog: Option<CatalogConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Catalog REST API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Base URL of the catalog API
    pub base_url: Url,
    /// Bearer token (server-side only)
    pub api_token: Option<SecretString>,
    /// How long image lookups stay cached
    pub image_cache_ttl: Duration,
    /// Timeout for a single image request
    pub request_timeout: Duration,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("image_cache_ttl", &self.image_cache_ttl)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl StateConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid or the catalog token
    /// fails validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_source(&EnvSource)
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`from_env`](Self::from_env).
    pub fn from_source(source: &impl VarSource) -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(get_or_default(source, "STOREFRONT_DATA_DIR", ".storefront"));
        let catalog = CatalogConfig::from_source(source)?;

        Ok(Self {
            data_dir,
            catalog,
            sentry_dsn: source.var("SENTRY_DSN"),
            sentry_environment: source.var("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration with in-tree defaults and no catalog.
    #[must_use]
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            catalog: None,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl CatalogConfig {
    fn from_source(source: &impl VarSource) -> Result<Option<Self>, ConfigError> {
        let Some(raw_url) = source.var("CATALOG_API_URL") else {
            return Ok(None);
        };

        let base_url = Url::parse(&raw_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CATALOG_API_URL".to_string(), e.to_string())
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "CATALOG_API_URL".to_string(),
                format!("unsupported scheme '{}'", base_url.scheme()),
            ));
        }

        let api_token = source
            .var("CATALOG_API_TOKEN")
            .map(|token| {
                validate_secret_strength(&token, "CATALOG_API_TOKEN")?;
                Ok::<_, ConfigError>(SecretString::from(token))
            })
            .transpose()?;

        Ok(Some(Self {
            base_url,
            api_token,
            image_cache_ttl: get_secs(source, "IMAGE_CACHE_TTL_SECS", 300)?,
            request_timeout: get_secs(source, "IMAGE_LOOKUP_TIMEOUT_SECS", 10)?,
        }))
    }
}

// =============================================================================
// Variable Sources
// =============================================================================

/// Where configuration variables are read from.
pub trait VarSource {
    /// Value of `key`, `None` if unset.
    fn var(&self, key: &str) -> Option<String>;
}

/// Process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl VarSource for EnvSource {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl VarSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a variable with a default value.
fn get_or_default(source: &impl VarSource, key: &str, default: &str) -> String {
    source.var(key).unwrap_or_else(|| default.to_string())
}

/// Get a positive number of seconds as a `Duration`.
fn get_secs(source: &impl VarSource, key: &str, default: u64) -> Result<Duration, ConfigError> {
    let Some(raw) = source.var(key) else {
        return Ok(Duration::from_secs(default));
    };
    let secs = raw
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Real API tokens have high entropy
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated token."
            ),
        ));
    }

    Ok(())
}
