//! Store traits for the identity subsystem's external collaborators.
//!
//! Persistence engine choice is out of scope here: the session manager
//! and verification dispatcher only see these traits. The [`memory`]
//! module provides the reference adapters used by tests; [`cache`]
//! wraps any credential store with a bounded, time-expiring lookup
//! cache.

pub mod cache;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use greenfig_core::{Email, UserId};

use crate::models::{Identity, NewIdentity, RefreshRecord};

pub use cache::CachedCredentialStore;
pub use memory::{InMemoryCredentialStore, InMemoryRefreshTokenStore};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or failed mid-call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Data held by the store is invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// The record targeted by an update does not exist.
    #[error("record not found")]
    NotFound,

    /// Constraint violation (unique email, one refresh record per
    /// identity, globally unique token values).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Holds user records: lookup by email and id, persist, update.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an identity by its email, matched case-sensitively.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, StoreError>;

    /// Look up an identity by its ID.
    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError>;

    /// Whether any identity is registered under `email`.
    async fn email_exists(&self, email: &Email) -> Result<bool, StoreError>;

    /// Persist a new identity; the store assigns the ID.
    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError>;

    /// Update an existing identity in place.
    async fn update(&self, identity: &Identity) -> Result<(), StoreError>;
}

/// Holds at most one live refresh record per identity.
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Look up a record by its token value.
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshRecord>, StoreError>;

    /// Look up the record owned by `user_id`.
    async fn find_by_user(&self, user_id: UserId) -> Result<Option<RefreshRecord>, StoreError>;

    /// Save a record, replacing any existing record for the same
    /// identity. The one-record-per-identity constraint lives here,
    /// not in the session manager.
    async fn save(&self, record: RefreshRecord) -> Result<(), StoreError>;

    /// Delete the record matching `token`. Returns whether a record
    /// was removed.
    async fn delete_by_token(&self, token: &str) -> Result<bool, StoreError>;

    /// Delete the record owned by `user_id`. Returns whether a record
    /// was removed.
    async fn delete_by_user(&self, user_id: UserId) -> Result<bool, StoreError>;
}
