//! Back-office configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BACKOFFICE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `BACKOFFICE_BASE_URL` - Public URL of the back office
//! - `BACKOFFICE_JWT_SECRET` - HS256 signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `BACKOFFICE_HOST` - Bind address (default: 127.0.0.1)
//! - `BACKOFFICE_PORT` - Listen port (default: 3001)
//! - `BACKOFFICE_JWT_TTL_HOURS` - Token lifetime in hours (default: 24)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (eBay - all three or none)
//! - `EBAY_CLIENT_ID` - eBay application client ID
//! - `EBAY_CLIENT_SECRET` - eBay application client secret
//! - `EBAY_RU_NAME` - Redirect URL name registered with eBay
//! - `EBAY_ENVIRONMENT` - `sandbox` (default) or `production`
//! - `EBAY_SCOPES` - Space separated OAuth scopes (default: sell.* read scopes)
//! - `EBAY_MARKETPLACE_ID` - Marketplace for analytics (default: `EBAY_US`)
//!
//! ## Optional (TLS)
//! - `BACKOFFICE_TLS_CERT` - PEM-encoded certificate chain
//! - `BACKOFFICE_TLS_KEY` - PEM-encoded private key

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::{ExposeSecret, SecretString};
use stockroom_core::EbayEnvironment;
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_JWT_TTL_HOURS: i64 = 24;
const DEFAULT_MARKETPLACE_ID: &str = "EBAY_US";

/// Scopes requested when `EBAY_SCOPES` is unset.
pub const DEFAULT_EBAY_SCOPES: &[&str] = &[
    "https://api.ebay.com/oauth/api_scope",
    "https://api.ebay.com/oauth/api_scope/sell.inventory.readonly",
    "https://api.ebay.com/oauth/api_scope/sell.fulfillment.readonly",
    "https://api.ebay.com/oauth/api_scope/sell.analytics.readonly",
];

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
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Back-office application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the back office
    pub base_url: String,
    /// HS256 signing secret for session tokens
    pub jwt_secret: SecretString,
    /// Lifetime of issued tokens, in hours
    pub jwt_ttl_hours: i64,
    /// eBay integration (optional)
    pub ebay: Option<EbayConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
    /// TLS configuration for HTTPS (optional)
    pub tls: Option<TlsConfig>,
}

/// eBay developer application credentials.
///
/// Implements `Debug` manually to redact the client secret.
#[derive(Clone)]
pub struct EbayConfig {
    pub environment: EbayEnvironment,
    pub client_id: String,
    pub client_secret: SecretString,
    /// eBay's "RuName", sent as `redirect_uri`
    pub ru_name: String,
    pub scopes: Vec<String>,
    pub marketplace_id: String,
}

impl std::fmt::Debug for EbayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EbayConfig")
            .field("environment", &self.environment)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("ru_name", &self.ru_name)
            .field("scopes", &self.scopes)
            .field("marketplace_id", &self.marketplace_id)
            .finish()
    }
}

impl EbayConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let client_id = get_optional_env("EBAY_CLIENT_ID");
        let client_secret = get_optional_env("EBAY_CLIENT_SECRET");
        let ru_name = get_optional_env("EBAY_RU_NAME");

        let (client_id, client_secret, ru_name) = match (client_id, client_secret, ru_name) {
            (Some(id), Some(secret), Some(ru_name)) => (id, secret, ru_name),
            (None, None, None) => return Ok(None),
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "EBAY_*".to_string(),
                    "EBAY_CLIENT_ID, EBAY_CLIENT_SECRET and EBAY_RU_NAME must be set together"
                        .to_string(),
                ));
            }
        };

        let environment = get_env_or_default("EBAY_ENVIRONMENT", "sandbox")
            .parse::<EbayEnvironment>()
            .map_err(|e| ConfigError::InvalidEnvVar("EBAY_ENVIRONMENT".to_string(), e))?;

        let scopes = get_optional_env("EBAY_SCOPES").map_or_else(
            || DEFAULT_EBAY_SCOPES.iter().map(ToString::to_string).collect(),
            |raw| parse_scopes(&raw),
        );
        if scopes.is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "EBAY_SCOPES".to_string(),
                "must contain at least one scope".to_string(),
            ));
        }

        Ok(Some(Self {
            environment,
            client_id,
            client_secret: SecretString::from(client_secret),
            ru_name,
            scopes,
            marketplace_id: get_env_or_default("EBAY_MARKETPLACE_ID", DEFAULT_MARKETPLACE_ID),
        }))
    }
}

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain
    pub cert_pem: String,
    /// PEM-encoded private key
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("BACKOFFICE_TLS_CERT");
        let key_pem = get_optional_env("BACKOFFICE_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar(
                "BACKOFFICE_TLS_*".to_string(),
                "Both BACKOFFICE_TLS_CERT and BACKOFFICE_TLS_KEY must be set together".to_string(),
            )),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("BACKOFFICE_DATABASE_URL")?;
        let host = get_env_or_default("BACKOFFICE_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("BACKOFFICE_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("BACKOFFICE_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("BACKOFFICE_PORT".to_string(), e.to_string()))?;
        let base_url = get_required_env("BACKOFFICE_BASE_URL")?;
        url::Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BACKOFFICE_BASE_URL".to_string(), e.to_string())
        })?;

        let jwt_secret = get_validated_secret("BACKOFFICE_JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "BACKOFFICE_JWT_SECRET")?;
        let jwt_ttl_hours = parse_ttl_hours(get_optional_env("BACKOFFICE_JWT_TTL_HOURS"))?;

        let ebay = EbayConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);
        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            jwt_secret,
            jwt_ttl_hours,
            ebay,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the eBay configuration, if the integration is enabled.
    #[must_use]
    pub const fn ebay(&self) -> Option<&EbayConfig> {
        self.ebay.as_ref()
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn uses_https(&self) -> bool {
        self.tls.is_some() || self.base_url.starts_with("https://")
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

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

fn parse_scopes(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_owned).collect()
}

fn parse_ttl_hours(raw: Option<String>) -> Result<i64, ConfigError> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_JWT_TTL_HOURS);
    };
    match raw.trim().parse::<i64>() {
        Ok(hours) if (1..=24 * 30).contains(&hours) => Ok(hours),
        Ok(hours) => Err(ConfigError::InvalidEnvVar(
            "BACKOFFICE_JWT_TTL_HOURS".to_string(),
            format!("must be between 1 and 720 (got {hours})"),
        )),
        Err(e) => Err(ConfigError::InvalidEnvVar(
            "BACKOFFICE_JWT_TTL_HOURS".to_string(),
            e.to_string(),
        )),
    }
}

/// Validate that a signing secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
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

    #[allow(clippy::cast_precision_loss)]
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
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
