//! Stateless signed-token codec.
//!
//! Signs and verifies compact claim sets (JWT, HS256) with a shared
//! symmetric key. Access tokens and email-verification tokens use the
//! same key and algorithm; the `purpose` claim is what keeps them from
//! being replayed across uses. Pure functions over the key material -
//! no I/O, safe to call from any number of tasks.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use greenfig_core::{Email, Role};

use crate::config::IdentityConfig;

/// Purpose claim value carried by email-verification tokens.
pub const EMAIL_VERIFICATION_PURPOSE: &str = "email_verification";

/// Failures verifying (or, rarely, producing) a signed token.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    /// The signature does not match the signing key.
    #[error("token signature is invalid")]
    InvalidSignature,
    /// The claim expiry has elapsed.
    #[error("token has expired")]
    Expired,
    /// The string cannot be parsed as a signed claim set.
    #[error("token is malformed")]
    Malformed,
}

/// Claim set carried inside every signed token.
///
/// Access tokens carry `role` and no `purpose`; verification tokens
/// carry `purpose` and no `role`. Never persisted - the artifact's
/// lifecycle is purely cryptographic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account email.
    pub sub: String,
    /// Role claim, present on access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Purpose claim, present on verification tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Issued-at (unix seconds).
    pub iat: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Signs and verifies compact claim sets with a symmetric key.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_secs: i64,
    verification_ttl_secs: i64,
}

impl TokenCodec {
    /// Build a codec from the identity configuration.
    #[must_use]
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(
            &config.signing_secret,
            ttl_to_secs(config.access_ttl),
            ttl_to_secs(config.verification_ttl),
        )
    }

    /// Build a codec from a raw secret and TTLs in seconds.
    #[must_use]
    pub fn new(secret: &SecretString, access_ttl_secs: i64, verification_ttl_secs: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            access_ttl_secs,
            verification_ttl_secs,
        }
    }

    /// Sign an access token asserting identity and role.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Malformed`] if the claim set cannot be
    /// serialized, which indicates a programming error rather than bad
    /// input.
    pub fn sign_access(&self, email: &Email, role: Role) -> Result<String, TokenError> {
        tracing::debug!(email = %email, role = %role, "signing access token");
        self.sign(Claims {
            sub: email.as_str().to_owned(),
            role: Some(role),
            purpose: None,
            iat: 0,
            exp: self.access_ttl_secs,
        })
    }

    /// Sign a purpose-scoped email-verification token.
    ///
    /// # Errors
    ///
    /// Same failure mode as [`Self::sign_access`].
    pub fn sign_verification(&self, email: &Email) -> Result<String, TokenError> {
        tracing::debug!(email = %email, "signing email verification token");
        self.sign(Claims {
            sub: email.as_str().to_owned(),
            role: None,
            purpose: Some(EMAIL_VERIFICATION_PURPOSE.to_owned()),
            iat: 0,
            exp: self.verification_ttl_secs,
        })
    }

    fn sign(&self, template: Claims) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            iat: now,
            exp: now + template.exp,
            ..template
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(map_jwt_error)
    }

    /// Verify a token's signature and expiry and return its claims.
    ///
    /// # Errors
    ///
    /// - [`TokenError::InvalidSignature`] if the signature does not match
    /// - [`TokenError::Expired`] if the expiry has elapsed
    /// - [`TokenError::Malformed`] if the string cannot be parsed
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is a contract, not a suggestion: no clock leeway.
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(map_jwt_error)
    }
}

fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed,
    }
}

fn ttl_to_secs(ttl: std::time::Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}
