//! In-memory reference adapters for the store traits.
//!
//! These back the test suites and double as executable documentation
//! of the constraints a production adapter must enforce: unique
//! emails, one live refresh record per identity, globally unique token
//! values.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use greenfig_core::{Email, UserId};

use super::{CredentialStore, RefreshTokenStore, StoreError};
use crate::models::{Identity, NewIdentity, RefreshRecord};

/// Credential store backed by a map under an async lock.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    inner: RwLock<CredentialTable>,
}

#[derive(Debug, Default)]
struct CredentialTable {
    users: HashMap<i64, Identity>,
    next_id: i64,
}

impl InMemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, StoreError> {
        let table = self.inner.read().await;
        Ok(table.users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        let table = self.inner.read().await;
        Ok(table.users.get(&id.as_i64()).cloned())
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, StoreError> {
        let table = self.inner.read().await;
        Ok(table.users.values().any(|u| &u.email == email))
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let mut table = self.inner.write().await;
        if table.users.values().any(|u| u.email == identity.email) {
            return Err(StoreError::Conflict(format!(
                "email already registered: {}",
                identity.email
            )));
        }

        table.next_id += 1;
        let stored = Identity {
            id: UserId::new(table.next_id),
            email: identity.email,
            username: identity.username,
            password_hash: identity.password_hash,
            role: identity.role,
            enabled: identity.enabled,
            created_at: Utc::now(),
        };
        table.users.insert(stored.id.as_i64(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        let mut table = self.inner.write().await;
        match table.users.get_mut(&identity.id.as_i64()) {
            Some(slot) => {
                *slot = identity.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }
}

/// Refresh token store keyed by owning identity, which makes the
/// one-record-per-identity constraint structural.
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    records: RwLock<HashMap<i64, RefreshRecord>>,
}

impl InMemoryRefreshTokenStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.values().find(|r| r.token == token).cloned())
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Option<RefreshRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records.get(&user_id.as_i64()).cloned())
    }

    async fn save(&self, record: RefreshRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        let taken_elsewhere = records
            .values()
            .any(|r| r.token == record.token && r.user_id != record.user_id);
        if taken_elsewhere {
            return Err(StoreError::Conflict(
                "token value already in use".to_string(),
            ));
        }

        records.insert(record.user_id.as_i64(), record);
        Ok(())
    }

    async fn delete_by_token(&self, token: &str) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        let owner = records
            .values()
            .find(|r| r.token == token)
            .map(|r| r.user_id.as_i64());
        Ok(owner.is_some_and(|key| records.remove(&key).is_some()))
    }

    async fn delete_by_user(&self, user_id: UserId) -> Result<bool, StoreError> {
        let mut records = self.records.write().await;
        Ok(records.remove(&user_id.as_i64()).is_some())
    }
}
