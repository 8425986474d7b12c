//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `BACKEND_URL` - Backend API origin. Falls back to `NEXT_PUBLIC_API_URL`,
//!   then `NEXT_PUBLIC_BACKEND_URL`, then `http://localhost:8000`
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 30)
//! - `VERCEL_AUTOMATION_BYPASS_SECRET` - Sent as `x-vercel-protection-bypass`
//! - `PUBLIC_API_URL` - API URL exposed to browser scripts (default: `/api`)
//! - `STRIPE_PUBLISHABLE_KEY` - Payment provider publishable key
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CONTENT_DIR` - Markdown content pages (default: `crates/storefront/content`)
//! - `STATIC_DIR` - Static assets (default: `crates/storefront/static`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 - 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate, 0.0 - 1.0 (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Backend origin variables in lookup order.
const BACKEND_URL_VARS: &[&str] = &["BACKEND_URL", "NEXT_PUBLIC_API_URL", "NEXT_PUBLIC_BACKEND_URL"];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Backend API access
    pub backend: BackendConfig,
    /// API URL handed to browser scripts
    pub public_api_url: String,
    /// Payment provider publishable key (safe to expose in browser)
    pub stripe_publishable_key: Option<String>,
    /// Directory with markdown content pages
    pub content_dir: PathBuf,
    /// Directory served under `/static`
    pub static_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Backend API configuration.
///
/// Implements `Debug` manually to redact the bypass secret.
#[derive(Clone)]
pub struct BackendConfig {
    /// Backend origin without trailing slash (e.g. `https://api.rinos-bikes.de`)
    pub origin: Url,
    /// Deployment-protection bypass secret
    pub bypass_secret: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("origin", &self.origin.as_str())
            .field(
                "bypass_secret",
                &self.bypass_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BackendConfig {
    /// Config pointing at `origin` with no bypass secret and the default
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `origin` is not an http(s) URL.
    pub fn new(origin: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            origin: parse_backend_origin("BACKEND_URL", origin)?,
            bypass_secret: None,
            timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
        })
    }

    /// Base URL for API calls: `{origin}/api/`.
    #[must_use]
    pub fn api_base(&self) -> String {
        format!("{}/api/", self.origin.as_str().trim_end_matches('/'))
    }

    fn from_env() -> Result<Self, ConfigError> {
        let (key, raw) = BACKEND_URL_VARS
            .iter()
            .find_map(|key| get_optional_env(key).map(|value| (*key, value)))
            .unwrap_or(("BACKEND_URL", DEFAULT_BACKEND_URL.to_string()));
        let origin = parse_backend_origin(key, &raw)?;

        let bypass_secret = match get_optional_env("VERCEL_AUTOMATION_BYPASS_SECRET") {
            Some(value) => {
                validate_secret_strength(&value, "VERCEL_AUTOMATION_BYPASS_SECRET")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        let timeout_secs = get_env_or_default(
            "BACKEND_TIMEOUT_SECS",
            &DEFAULT_BACKEND_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("BACKEND_TIMEOUT_SECS".to_string(), e.to_string()))?;

        Ok(Self {
            origin,
            bypass_secret,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the bypass secret looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        Ok(Self {
            host,
            port,
            base_url,
            backend: BackendConfig::from_env()?,
            public_api_url: get_env_or_default("PUBLIC_API_URL", "/api"),
            stripe_publishable_key: get_optional_env("STRIPE_PUBLISHABLE_KEY"),
            content_dir: PathBuf::from(get_env_or_default(
                "CONTENT_DIR",
                "crates/storefront/content",
            )),
            static_dir: PathBuf::from(get_env_or_default(
                "STATIC_DIR",
                "crates/storefront/static",
            )),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: get_sample_rate("SENTRY_SAMPLE_RATE", 1.0)?,
            sentry_traces_sample_rate: get_sample_rate("SENTRY_TRACES_SAMPLE_RATE", 0.0)?,
        })
    }

    /// Configuration for tests and local tooling: everything defaulted except
    /// the backend.
    #[must_use]
    pub fn for_backend(backend: BackendConfig) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            backend,
            public_api_url: "/api".to_string(),
            stripe_publishable_key: None,
            content_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/content")),
            static_dir: PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/static")),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` flag.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional, non-empty environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse a sample rate in `0.0..=1.0`.
fn get_sample_rate(key: &str, default: f32) -> Result<f32, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(default);
    };
    let rate = raw
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
}

/// Parse the backend origin, accepting only http(s) URLs.
fn parse_backend_origin(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected an http(s) URL with a host (got scheme '{scheme}')"),
        )),
    }
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
    let len = s.chars().count() as f64;
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

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-bypass-secret", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("Qm7fK2pX9vLr4TzW8nBc3HdJ6sYg1aEu", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_backend_origin_accepts_http_and_https() {
        assert!(parse_backend_origin("K", "http://localhost:8000").is_ok());
        assert!(parse_backend_origin("K", " https://api.rinos-bikes.de ").is_ok());
    }

    #[test]
    fn test_backend_origin_rejects_other_schemes() {
        assert!(matches!(
            parse_backend_origin("K", "ftp://files.example"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_backend_origin("K", "not a url").is_err());
    }

    #[test]
    fn test_api_base_strips_trailing_slash() {
        let backend = BackendConfig::new("https://api.rinos-bikes.de/").unwrap();
        assert_eq!(backend.api_base(), "https://api.rinos-bikes.de/api/");
        let backend = BackendConfig::new("http://localhost:8000").unwrap();
        assert_eq!(backend.api_base(), "http://localhost:8000/api/");
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig::for_backend(BackendConfig::new(DEFAULT_BACKEND_URL).unwrap());
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_backend_config_debug_redacts_secret() {
        let mut backend = BackendConfig::new("https://api.rinos-bikes.de").unwrap();
        backend.bypass_secret = Some(SecretString::from("super_secret_bypass_value"));

        let debug_output = format!("{backend:?}");

        assert!(debug_output.contains("api.rinos-bikes.de"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_bypass_value"));
        assert_eq!(
            backend.bypass_secret.unwrap().expose_secret(),
            "super_secret_bypass_value"
        );
    }
}
