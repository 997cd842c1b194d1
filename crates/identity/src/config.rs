//! Identity configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `AUTH_SIGNING_SECRET` - HMAC signing secret for all tokens (min 32 chars)
//! - `APP_BASE_URL` - Public base URL, used to build verification links
//!
//! ## Optional
//! - `AUTH_ACCESS_TTL_SECS` - Access token lifetime (default: 900)
//! - `AUTH_REFRESH_TTL_SECS` - Refresh token lifetime (default: 604800)
//! - `AUTH_VERIFICATION_TTL_SECS` - Verification token lifetime (default: 86400)
//!
//! ## Optional (SMTP - enables verification email delivery)
//! - `SMTP_HOST` - SMTP server hostname (presence enables the group)
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_USERNAME` - SMTP authentication username
//! - `SMTP_PASSWORD` - SMTP authentication password
//! - `SMTP_FROM` - Email sender address

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const MIN_SIGNING_SECRET_LENGTH: usize = 32;

const DEFAULT_ACCESS_TTL_SECS: u64 = 900; // 15 minutes
const DEFAULT_REFRESH_TTL_SECS: u64 = 7 * 24 * 60 * 60; // 7 days
const DEFAULT_VERIFICATION_TTL_SECS: u64 = 24 * 60 * 60; // 24 hours
const DEFAULT_SMTP_PORT: u16 = 587;

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

/// Identity subsystem configuration.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// HMAC signing secret shared by access and verification tokens.
    pub signing_secret: SecretString,
    /// Lifetime of signed access tokens.
    pub access_ttl: Duration,
    /// Lifetime of server-side refresh records.
    pub refresh_ttl: Duration,
    /// Lifetime of email-verification tokens.
    pub verification_ttl: Duration,
    /// Public base URL, used to build verification links.
    pub base_url: String,
    /// SMTP configuration (optional - without it, verification emails
    /// are dispatched to whatever [`crate::Mailer`] is wired in).
    pub smtp: Option<SmtpConfig>,
}

/// SMTP delivery configuration.
#[derive(Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port.
    pub port: u16,
    /// SMTP authentication username.
    pub username: String,
    /// SMTP authentication password.
    pub password: SecretString,
    /// Sender address for outgoing mail.
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl IdentityConfig {
    /// Load configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, a value
    /// cannot be parsed, or the signing secret is too short.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_source(&|key| std::env::var(key).ok())
    }

    /// Whether cookies built from this config should carry the `Secure`
    /// attribute. Derived from the base URL scheme.
    #[must_use]
    pub fn cookies_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }

    fn from_source(source: &dyn Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let signing_secret = required(source, "AUTH_SIGNING_SECRET")?;
        if signing_secret.len() < MIN_SIGNING_SECRET_LENGTH {
            return Err(ConfigError::InsecureSecret(
                "AUTH_SIGNING_SECRET".to_string(),
                format!("must be at least {MIN_SIGNING_SECRET_LENGTH} characters"),
            ));
        }

        let base_url = required(source, "APP_BASE_URL")?;

        Ok(Self {
            signing_secret: SecretString::from(signing_secret),
            access_ttl: ttl_secs(source, "AUTH_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?,
            refresh_ttl: ttl_secs(source, "AUTH_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?,
            verification_ttl: ttl_secs(
                source,
                "AUTH_VERIFICATION_TTL_SECS",
                DEFAULT_VERIFICATION_TTL_SECS,
            )?,
            base_url,
            smtp: smtp_group(source)?,
        })
    }
}

fn required(source: &dyn Fn(&str) -> Option<String>, key: &str) -> Result<String, ConfigError> {
    source(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

fn ttl_secs(
    source: &dyn Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    let secs = match source(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?,
        None => default,
    };

    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }

    Ok(Duration::from_secs(secs))
}

/// The SMTP group is all-or-nothing: `SMTP_HOST` enables it, and the
/// remaining credentials then become required.
fn smtp_group(source: &dyn Fn(&str) -> Option<String>) -> Result<Option<SmtpConfig>, ConfigError> {
    let Some(host) = source("SMTP_HOST") else {
        return Ok(None);
    };

    let port = match source("SMTP_PORT") {
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SMTP_PORT".to_string(), e.to_string()))?,
        None => DEFAULT_SMTP_PORT,
    };

    Ok(Some(SmtpConfig {
        host,
        port,
        username: required(source, "SMTP_USERNAME")?,
        password: SecretString::from(required(source, "SMTP_PASSWORD")?),
        from_address: required(source, "SMTP_FROM")?,
    }))
}
