//! Password hashing seam.
//!
//! The algorithm is a pluggable detail behind [`PasswordHasher`]; the
//! session manager only needs a one-way hash with verify. The default
//! adapter is Argon2id via the `argon2` crate.

use argon2::password_hash::{PasswordHash, SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher as _, PasswordVerifier as _};
use thiserror::Error;

/// Errors from the hashing backend.
#[derive(Debug, Error)]
pub enum HashError {
    /// Hashing the supplied password failed.
    #[error("failed to hash password: {0}")]
    Hash(String),
    /// The stored hash string cannot be parsed.
    #[error("stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// One-way password hash with verify capability.
pub trait PasswordHasher: Send + Sync {
    /// Hash a raw password into a self-describing storable string.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Hash`] if the backend rejects the input.
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// Verify a raw password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`, not an error; only an unreadable
    /// stored hash is an error.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::MalformedHash`] if the stored hash cannot
    /// be parsed.
    fn verify(&self, password: &str, stored: &str) -> Result<bool, HashError>;
}

/// Argon2id adapter with the crate's default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| HashError::Hash(e.to_string()))
    }

    fn verify(&self, password: &str, stored: &str) -> Result<bool, HashError> {
        let parsed = PasswordHash::new(stored).map_err(|e| HashError::MalformedHash(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher;
        let hash = hasher.hash("pw12345678").unwrap();

        assert!(hasher.verify("pw12345678", &hash).unwrap());
        assert!(!hasher.verify("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = Argon2Hasher;
        let a = hasher.hash("pw12345678").unwrap();
        let b = hasher.hash("pw12345678").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_stored_hash() {
        let hasher = Argon2Hasher;
        assert!(matches!(
            hasher.verify("pw12345678", "not-a-phc-string"),
            Err(HashError::MalformedHash(_))
        ));
    }
}
