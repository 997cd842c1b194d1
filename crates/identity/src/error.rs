//! Unified error handling for the identity subsystem.
//!
//! All failures are raised at the session-manager boundary and
//! translated once, at the edge, into user-visible responses. The
//! [`ErrorClass`] mapping is that single translation point: HTTP
//! controllers (out of scope here) turn a class into a status code
//! without inspecting individual variants.

use thiserror::Error;

use greenfig_core::{EmailError, UsernameError};

use crate::hash::HashError;
use crate::store::StoreError;
use crate::token::TokenError;

/// Failures raised by the session manager and verification handler.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No identity or token record matches the request.
    #[error("not found")]
    NotFound,

    /// Password did not verify. Deliberately does not say which factor
    /// failed.
    #[error("invalid credentials")]
    BadCredentials,

    /// Credentials are valid but the email has not been verified yet.
    #[error("account is not verified")]
    NotEnabled,

    /// Registration conflict: the email is already taken.
    #[error("an account with this email already exists")]
    AlreadyExists,

    /// The request is missing its refresh artifact.
    #[error("refresh token is required")]
    BadRequest,

    /// The refresh artifact is unknown, expired, or orphaned.
    #[error("invalid refresh token")]
    InvalidToken,

    /// A signed token was presented for a use its purpose claim does
    /// not allow.
    #[error("token purpose does not allow this operation")]
    WrongPurpose,

    /// The supplied email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The supplied username failed validation.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] UsernameError),

    /// The supplied password is below the minimum length.
    #[error("password must be at least {min} characters")]
    WeakPassword {
        /// Minimum allowed length.
        min: usize,
    },

    /// Signature, expiry, or parse failure on a signed token.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Password hashing failed.
    #[error("password hashing error: {0}")]
    Hash(#[from] HashError),

    /// A store call failed. Fatal to the current request; the caller
    /// retries.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Edge-facing classification of an [`AuthError`].
///
/// All signature/claim problems collapse into `Unauthorized` so the
/// response never reveals which check failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 404-equivalent.
    NotFound,
    /// 401-equivalent: authorization required.
    Unauthorized,
    /// 403-equivalent: authenticated but not allowed. Surfaced
    /// distinctly so clients can prompt re-verification.
    Forbidden,
    /// 409-equivalent registration conflict.
    Conflict,
    /// 400-equivalent malformed or incomplete request.
    BadRequest,
    /// 500-equivalent; details stay server-side.
    Internal,
}

impl AuthError {
    /// Classify this error for the edge.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound => ErrorClass::NotFound,
            Self::BadCredentials | Self::InvalidToken | Self::WrongPurpose | Self::Token(_) => {
                ErrorClass::Unauthorized
            }
            Self::NotEnabled => ErrorClass::Forbidden,
            Self::AlreadyExists => ErrorClass::Conflict,
            Self::BadRequest
            | Self::InvalidEmail(_)
            | Self::InvalidUsername(_)
            | Self::WeakPassword { .. } => ErrorClass::BadRequest,
            Self::Hash(_) | Self::Store(_) => ErrorClass::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_problems_share_one_class() {
        // A caller probing the API must not be able to distinguish a
        // bad signature from an expired token from a replayed purpose.
        assert_eq!(
            AuthError::Token(TokenError::InvalidSignature).class(),
            ErrorClass::Unauthorized
        );
        assert_eq!(
            AuthError::Token(TokenError::Expired).class(),
            ErrorClass::Unauthorized
        );
        assert_eq!(
            AuthError::Token(TokenError::Malformed).class(),
            ErrorClass::Unauthorized
        );
        assert_eq!(AuthError::WrongPurpose.class(), ErrorClass::Unauthorized);
        assert_eq!(AuthError::InvalidToken.class(), ErrorClass::Unauthorized);
        assert_eq!(AuthError::BadCredentials.class(), ErrorClass::Unauthorized);
    }

    #[test]
    fn test_not_enabled_is_surfaced_distinctly() {
        assert_eq!(AuthError::NotEnabled.class(), ErrorClass::Forbidden);
    }

    #[test]
    fn test_remaining_classes() {
        assert_eq!(AuthError::NotFound.class(), ErrorClass::NotFound);
        assert_eq!(AuthError::AlreadyExists.class(), ErrorClass::Conflict);
        assert_eq!(AuthError::BadRequest.class(), ErrorClass::BadRequest);
        assert_eq!(
            AuthError::WeakPassword { min: 8 }.class(),
            ErrorClass::BadRequest
        );
        assert_eq!(
            AuthError::Store(StoreError::Unavailable("down".to_string())).class(),
            ErrorClass::Internal
        );
    }
}
