//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PSM_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `PSM_SAVE_TOKEN_SECRET` - HMAC key for admin save tokens (min 32 chars, high entropy)
//!
//! ## Optional
//! - `PSM_HOST` - Bind address (default: 127.0.0.1)
//! - `PSM_PORT` - Listen port (default: 3000)
//! - `PSM_SAVE_TOKEN_TTL_SECS` - Save token lifetime (default: 86400)
//! - `PSM_INSTANCE_CACHE_TTL_SECS` - Instance list cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Traces sample rate (default: 0.1)

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const SAVE_TOKEN_SECRET_VAR: &str = "PSM_SAVE_TOKEN_SECRET";
const MIN_SAVE_TOKEN_SECRET_CHARS: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Lowercase fragments that mark a copied sample value.
const PLACEHOLDER_FRAGMENTS: &[&str] = &["changeme", "placeholder", "example", "your-", "xxx"];

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

/// Server configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// HMAC key for admin save tokens
    pub save_token_secret: SecretString,
    /// How long an issued save token stays valid
    pub save_token_ttl: Duration,
    /// How long the shipping method instance list is cached
    pub instance_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("save_token_secret", &"[REDACTED]")
            .field("save_token_ttl", &self.save_token_ttl)
            .field("instance_cache_ttl", &self.instance_cache_ttl)
            .field("sentry_dsn", &self.sentry_dsn)
            .field("sentry_environment", &self.sentry_environment)
            .field("sentry_sample_rate", &self.sentry_sample_rate)
            .field("sentry_traces_sample_rate", &self.sentry_traces_sample_rate)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = database_url()?;
        let host = parse_env("PSM_HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = parse_env("PSM_PORT", 3000_u16)?;

        let save_token_secret = save_token_secret()?;

        let save_token_ttl = Duration::from_secs(parse_env("PSM_SAVE_TOKEN_TTL_SECS", 86_400)?);
        let instance_cache_ttl =
            Duration::from_secs(parse_env("PSM_INSTANCE_CACHE_TTL_SECS", 300)?);

        let sentry_dsn = std::env::var("SENTRY_DSN").ok();
        let sentry_environment = std::env::var("SENTRY_ENVIRONMENT").ok();
        let sentry_sample_rate = parse_env("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = parse_env("SENTRY_TRACES_SAMPLE_RATE", 0.1)?;

        Ok(Self {
            database_url,
            host,
            port,
            save_token_secret,
            save_token_ttl,
            instance_cache_ttl,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Environment
// =============================================================================

/// `PSM_DATABASE_URL`, or the `DATABASE_URL` set by a Fly.io postgres attach.
fn database_url() -> Result<SecretString, ConfigError> {
    std::env::var("PSM_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar("PSM_DATABASE_URL".to_string()))
}

/// Parse a variable, or use `default` when it is unset.
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

fn save_token_secret() -> Result<SecretString, ConfigError> {
    let value = std::env::var(SAVE_TOKEN_SECRET_VAR)
        .map_err(|_| ConfigError::MissingEnvVar(SAVE_TOKEN_SECRET_VAR.to_string()))?;
    if let Some(problem) = weak_secret(&value) {
        return Err(ConfigError::InsecureSecret(
            SAVE_TOKEN_SECRET_VAR.to_string(),
            problem,
        ));
    }
    Ok(SecretString::from(value))
}

// =============================================================================
// Secret Strength
// =============================================================================

/// Why `secret` is not fit to sign save tokens, if it is not.
fn weak_secret(secret: &str) -> Option<String> {
    let chars = secret.chars().count();
    if chars < MIN_SAVE_TOKEN_SECRET_CHARS {
        return Some(format!(
            "must be at least {MIN_SAVE_TOKEN_SECRET_CHARS} characters (got {chars})"
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().find(|f| lower.contains(*f)) {
        return Some(format!("looks like a placeholder (contains '{fragment}')"));
    }

    let entropy = bits_per_char(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Some(format!(
            "entropy {entropy:.2} bits/char is below {MIN_ENTROPY_BITS_PER_CHAR:.1}; use a random key"
        ));
    }

    None
}

/// Shannon entropy of the character distribution.
#[allow(clippy::cast_precision_loss)]
fn bits_per_char(s: &str) -> f64 {
    let mut counts: BTreeMap<char, usize> = BTreeMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total = counts.values().sum::<usize>() as f64;
    counts
        .values()
        .map(|&n| {
            let p = n as f64 / total;
            -p * p.log2()
        })
        .sum()
}
