//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FASTLANCHE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `FASTLANCHE_BASE_URL` - Public URL the API is served from
//!
//! ## Optional
//! - `FASTLANCHE_HOST` - Bind address (default: 127.0.0.1)
//! - `FASTLANCHE_PORT` - Listen port (default: 3000)
//! - `FASTLANCHE_CORS_ORIGINS` - Comma-separated browser origins allowed to call the API
//! - `FASTLANCHE_ESTABLISHMENT_NAME` - Display name (default: Fast Lanche)
//! - `FASTLANCHE_AUTH_RATE_LIMIT_BURST` - Login/register requests per IP before throttling (default: 5, `0` disables)
//! - `FASTLANCHE_AUTH_RATE_LIMIT_SECONDS` - Seconds to earn back one request (default: 6)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (e.g. production)
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Per-IP limit on login and registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRateLimit {
    /// Requests allowed back to back. `0` disables the limiter.
    pub burst: u32,
    /// Seconds to earn back one request
    pub replenish_seconds: u64,
}

impl AuthRateLimit {
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.burst > 0 && self.replenish_seconds > 0
    }
}

impl Default for AuthRateLimit {
    fn default() -> Self {
        Self {
            burst: 5,
            replenish_seconds: 6,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: Url,
    /// Origins allowed by CORS. Empty means same-origin only.
    pub cors_origins: Vec<String>,
    /// Establishment display name, reported by the health endpoint
    pub establishment_name: String,
    /// Throttling of login and registration
    pub auth_rate_limit: AuthRateLimit,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of requests traced in Sentry
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("FASTLANCHE_DATABASE_URL")?;
        let host = parse_env("FASTLANCHE_HOST", "127.0.0.1")?;
        let port = parse_env("FASTLANCHE_PORT", "3000")?;
        let base_url = get_required_env("FASTLANCHE_BASE_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("FASTLANCHE_BASE_URL".to_string(), e.to_string())
        })?;
        let cors_origins = parse_origins(&get_env_or_default("FASTLANCHE_CORS_ORIGINS", ""));
        let establishment_name = get_env_or_default("FASTLANCHE_ESTABLISHMENT_NAME", "Fast Lanche");
        let auth_rate_limit = AuthRateLimit {
            burst: parse_env("FASTLANCHE_AUTH_RATE_LIMIT_BURST", "5")?,
            replenish_seconds: parse_env("FASTLANCHE_AUTH_RATE_LIMIT_SECONDS", "6")?,
        };

        let sentry_sample_rate = parse_rate("SENTRY_SAMPLE_RATE", "1.0")?;
        let sentry_traces_sample_rate = parse_rate("SENTRY_TRACES_SAMPLE_RATE", "0.0")?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            cors_origins,
            establishment_name,
            auth_rate_limit,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies should carry the `Secure` flag.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.scheme() == "https"
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a Sentry sample rate, which must lie in `0.0..=1.0`.
fn parse_rate(key: &str, default: &str) -> Result<f32, ConfigError> {
    let rate: f32 = parse_env(key, default)?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ))
    }
}

/// Split a comma-separated origin list, dropping blanks and trailing slashes.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|origin| origin.trim().trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://localhost/fastlanche"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: Url::parse(base_url).unwrap(),
            cors_origins: Vec::new(),
            establishment_name: "Fast Lanche".to_string(),
            auth_rate_limit: AuthRateLimit::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("http://localhost:3000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        assert!(!config("http://localhost:3000").secure_cookies());
        assert!(config("https://pedidos.fastlanche.com.br").secure_cookies());
    }

    #[test]
    fn test_parse_origins() {
        assert_eq!(
            parse_origins(" http://localhost:5173/ , ,https://app.fastlanche.com.br"),
            vec!["http://localhost:5173", "https://app.fastlanche.com.br"]
        );
        assert!(parse_origins("").is_empty());
    }

    #[test]
    fn test_parse_rate_rejects_out_of_range() {
        // Unset keys fall back to the default, which is what gets validated
        assert!(parse_rate("FASTLANCHE_TEST_UNSET_RATE", "0.25").is_ok());
        assert!(matches!(
            parse_rate("FASTLANCHE_TEST_UNSET_RATE", "1.5"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_rate("FASTLANCHE_TEST_UNSET_RATE", "abc").is_err());
    }

    #[test]
    fn test_auth_rate_limit_can_be_disabled() {
        assert!(AuthRateLimit::default().is_enabled());
        let off = AuthRateLimit {
            burst: 0,
            ..AuthRateLimit::default()
        };
        assert!(!off.is_enabled());
    }
}
