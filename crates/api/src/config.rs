//! API configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `JWT_SECRET` - Session token signing secret (min 32 chars, high entropy)
//! - `BRAINTREE_MERCHANT_ID` - Braintree merchant account ID
//! - `BRAINTREE_PUBLIC_KEY` - Braintree API public key
//! - `BRAINTREE_PRIVATE_KEY` - Braintree API private key
//!
//! ## Optional
//! - `BAZAAR_HOST` - Bind address (default: 127.0.0.1)
//! - `BAZAAR_PORT` - Listen port (default: 8080)
//! - `BRAINTREE_ENVIRONMENT` - `sandbox` or `production` (default: sandbox)
//! - `SESSION_TTL_DAYS` - Session token lifetime in days (default: 7, at most 365)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SESSION_TTL_DAYS: i64 = 7;
const MAX_SESSION_TTL_DAYS: i64 = 365;

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

/// API application configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// HS256 signing secret for session tokens
    pub jwt_secret: SecretString,
    /// Session token lifetime in days
    pub session_ttl_days: i64,
    /// Payment gateway credentials
    pub braintree: BraintreeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. `production`)
    pub sentry_environment: Option<String>,
}

/// Which Braintree deployment to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BraintreeEnvironment {
    #[default]
    Sandbox,
    Production,
}

impl BraintreeEnvironment {
    /// GraphQL endpoint for this environment.
    #[must_use]
    pub const fn graphql_url(self) -> &'static str {
        match self {
            Self::Sandbox => "https://payments.sandbox.braintree-api.com/graphql",
            Self::Production => "https://payments.braintree-api.com/graphql",
        }
    }
}

impl std::str::FromStr for BraintreeEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sandbox" => Ok(Self::Sandbox),
            "production" => Ok(Self::Production),
            other => Err(format!("expected sandbox or production, got {other}")),
        }
    }
}

/// Braintree API credentials.
///
/// Implements `Debug` manually to redact the private key.
#[derive(Clone)]
pub struct BraintreeConfig {
    /// Sandbox or production
    pub environment: BraintreeEnvironment,
    /// Merchant account ID
    pub merchant_id: String,
    /// API public key (used as the basic-auth user)
    pub public_key: String,
    /// API private key (used as the basic-auth password)
    pub private_key: SecretString,
}

impl std::fmt::Debug for BraintreeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BraintreeConfig")
            .field("environment", &self.environment)
            .field("merchant_id", &self.merchant_id)
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the signing secret fails validation (length, placeholder detection,
    /// entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BAZAAR_DATABASE_URL")?;
        let host = parse_env("BAZAAR_HOST", "127.0.0.1")?;
        let port = parse_env("BAZAAR_PORT", "8080")?;

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;

        let session_ttl_days = validate_session_ttl(parse_env(
            "SESSION_TTL_DAYS",
            &DEFAULT_SESSION_TTL_DAYS.to_string(),
        )?)?;

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            session_ttl_days,
            braintree: BraintreeConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl BraintreeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: parse_env("BRAINTREE_ENVIRONMENT", "sandbox")?,
            merchant_id: get_required_env("BRAINTREE_MERCHANT_ID")?,
            public_key: get_required_env("BRAINTREE_PUBLIC_KEY")?,
            private_key: SecretString::from(get_required_env("BRAINTREE_PRIVATE_KEY")?),
        })
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
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Parse an environment variable, falling back to a default when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Validate that a signing secret meets minimum length requirements.
/// Session lifetimes run from one day up to a year.
fn validate_session_ttl(days: i64) -> Result<i64, ConfigError> {
    if (1..=MAX_SESSION_TTL_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(ConfigError::InvalidEnvVar(
            "SESSION_TTL_DAYS".to_string(),
            format!("must be between 1 and {MAX_SESSION_TTL_DAYS} days"),
        ))
    }
}

fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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

    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_braintree() -> BraintreeConfig {
        BraintreeConfig {
            environment: BraintreeEnvironment::Sandbox,
            merchant_id: "merchant_123".to_string(),
            public_key: "public_key_value".to_string(),
            private_key: SecretString::from("super_private_key_value"),
        }
    }

    #[test]
    fn test_shannon_entropy_bounds() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy("Qw7#Lp2@Zx9!Mn4$") > 3.3);
    }

    #[test]
    fn test_placeholder_secrets_rejected() {
        for candidate in ["your-jwt-key-goes-here", "changeme-now-please", "my-jwt-secret-value"] {
            let err = validate_secret_strength(candidate, "JWT_SECRET").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        }
    }

    #[test]
    fn test_low_entropy_secret_rejected() {
        assert!(validate_secret_strength(&"ab".repeat(20), "JWT_SECRET").is_err());
    }

    #[test]
    fn test_random_secret_accepted() {
        assert!(validate_secret_strength("Qw7#Lp2@Zx9!Mn4$Rt6%Vb8^Hk1&Jd3*", "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_secret_length() {
        assert!(validate_secret_length(&SecretString::from("short"), "JWT_SECRET").is_err());
        assert!(validate_secret_length(&SecretString::from("k".repeat(32)), "JWT_SECRET").is_ok());
    }

    #[test]
    fn test_braintree_environment_parsing() {
        assert_eq!(
            "Sandbox".parse::<BraintreeEnvironment>().unwrap(),
            BraintreeEnvironment::Sandbox
        );
        assert_eq!(
            "production".parse::<BraintreeEnvironment>().unwrap(),
            BraintreeEnvironment::Production
        );
        assert!("staging".parse::<BraintreeEnvironment>().is_err());
        assert!(
            BraintreeEnvironment::Sandbox
                .graphql_url()
                .contains("sandbox")
        );
    }

    #[test]
    fn test_session_ttl_bounds() {
        assert_eq!(validate_session_ttl(7).unwrap(), 7);
        assert_eq!(validate_session_ttl(365).unwrap(), 365);
        assert!(validate_session_ttl(0).is_err());
        assert!(validate_session_ttl(-3).is_err());
        assert!(validate_session_ttl(366).is_err());
        assert!(validate_session_ttl(i64::MAX).is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ApiConfig {
            database_url: SecretString::from("postgres://localhost/bazaar"),
            host: "127.0.0.1".parse().unwrap(),
            port: 8080,
            jwt_secret: SecretString::from("k".repeat(32)),
            session_ttl_days: 7,
            braintree: test_braintree(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.to_string(), "127.0.0.1:8080");
    }

    #[test]
    fn test_braintree_debug_redacts_private_key() {
        let debug_output = format!("{:?}", test_braintree());
        assert!(debug_output.contains("merchant_123"));
        assert!(debug_output.contains("public_key_value"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_private_key_value"));
    }
}
