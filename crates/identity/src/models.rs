//! Identity domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use greenfig_core::{Email, Role, UserId, Username};

/// A customer account as held by the credential store.
///
/// Created at registration with `enabled = false`; flipped to `true`
/// exactly once by a successful email verification. This subsystem
/// never deletes identities.
#[derive(Debug, Clone)]
pub struct Identity {
    /// Unique account ID.
    pub id: UserId,
    /// Login key. Unique, matched case-sensitively.
    pub email: Email,
    /// Display name.
    pub username: Username,
    /// One-way password hash in PHC string format.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Whether email ownership has been confirmed. Gates login.
    pub enabled: bool,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A not-yet-persisted identity, handed to the credential store which
/// assigns the ID.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    /// Login key.
    pub email: Email,
    /// Display name.
    pub username: Username,
    /// One-way password hash.
    pub password_hash: String,
    /// Account role.
    pub role: Role,
    /// Always `false` at registration.
    pub enabled: bool,
}

/// Server-side refresh token record.
///
/// At most one live record exists per identity. Reused while
/// unexpired; deleted and recreated once expired; destroyed by logout
/// and revocation.
#[derive(Debug, Clone)]
pub struct RefreshRecord {
    /// Opaque, globally unique token value.
    pub token: String,
    /// Owning identity.
    pub user_id: UserId,
    /// When the record stops being exchangeable.
    pub expires_at: DateTime<Utc>,
}

impl RefreshRecord {
    /// Issue a fresh record for `user_id` with a random token.
    #[must_use]
    pub fn issue(user_id: UserId, ttl: std::time::Duration) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + ttl,
        }
    }

    /// Whether the record is still exchangeable for access tokens.
    #[must_use]
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Confirmation payload returned by a successful registration.
///
/// No tokens: the account is not enabled until the email round trip
/// completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterReceipt {
    /// Display name as registered.
    pub username: Username,
    /// Registered email address.
    pub email: Email,
    /// Human-readable confirmation message.
    pub message: String,
}
