//! Bounded, time-expiring lookup cache for credential reads.
//!
//! Login and refresh both hit the credential store by email; this
//! wrapper absorbs repeat lookups via `moka`. Caching is an
//! optimization, not a contract: every write through the wrapper
//! invalidates the cached entry for that email, and entries expire on
//! their own TTL regardless.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use greenfig_core::{Email, UserId};

use super::{CredentialStore, StoreError};
use crate::models::{Identity, NewIdentity};

/// Read-through cache in front of any [`CredentialStore`], keyed by
/// email.
pub struct CachedCredentialStore<S> {
    inner: S,
    by_email: Cache<Email, Identity>,
}

impl<S: CredentialStore> CachedCredentialStore<S> {
    /// Wrap `inner` with a cache holding at most `capacity` entries
    /// for at most `ttl`.
    #[must_use]
    pub fn new(inner: S, capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            by_email: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }
}

#[async_trait]
impl<S: CredentialStore> CredentialStore for CachedCredentialStore<S> {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Identity>, StoreError> {
        if let Some(hit) = self.by_email.get(email).await {
            return Ok(Some(hit));
        }

        let found = self.inner.find_by_email(email).await?;
        if let Some(identity) = &found {
            self.by_email.insert(email.clone(), identity.clone()).await;
        }
        Ok(found)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<Identity>, StoreError> {
        // ID lookups bypass the cache; it is keyed by email only.
        self.inner.find_by_id(id).await
    }

    async fn email_exists(&self, email: &Email) -> Result<bool, StoreError> {
        if self.by_email.contains_key(email) {
            return Ok(true);
        }
        self.inner.email_exists(email).await
    }

    async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let stored = self.inner.insert(identity).await?;
        self.by_email.invalidate(&stored.email).await;
        Ok(stored)
    }

    async fn update(&self, identity: &Identity) -> Result<(), StoreError> {
        self.inner.update(identity).await?;
        self.by_email.invalidate(&identity.email).await;
        Ok(())
    }
}
