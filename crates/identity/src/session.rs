//! The session manager.
//!
//! Orchestrates login, registration, refresh, logout, and revocation
//! over the credential and refresh-token stores. Every operation takes
//! its identity context explicitly - there is no ambient
//! "current user" anywhere in this crate.
//!
//! Refresh policy: one live refresh record per identity, reused while
//! unexpired, replaced once expired. `refresh` itself never writes to
//! the refresh store; it only mints a new access token. Concurrent
//! logins for the same identity may race on the replace path and the
//! last writer wins - the loser's record simply becomes unusable and
//! forces a re-login.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;

use greenfig_core::{Email, Role, Username};

use crate::config::IdentityConfig;
use crate::cookie::{ACCESS_COOKIE, REFRESH_COOKIE, SessionCookie, SessionCookies};
use crate::error::AuthError;
use crate::hash::PasswordHasher;
use crate::models::{Identity, NewIdentity, RefreshRecord, RegisterReceipt};
use crate::store::{CredentialStore, RefreshTokenStore};
use crate::token::TokenCodec;
use crate::verification::RegistrationEvent;

/// Minimum password length accepted at registration.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Orchestrates the identity and session lifecycle.
pub struct SessionManager<C, R, H> {
    credentials: Arc<C>,
    refresh_tokens: Arc<R>,
    hasher: Arc<H>,
    codec: Arc<TokenCodec>,
    events: mpsc::UnboundedSender<RegistrationEvent>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    secure_cookies: bool,
}

impl<C, R, H> SessionManager<C, R, H>
where
    C: CredentialStore,
    R: RefreshTokenStore,
    H: PasswordHasher,
{
    /// Build a session manager over its collaborators.
    ///
    /// `events` feeds the verification dispatcher; registration keeps
    /// working if the receiving side is gone, it just logs the drop.
    #[must_use]
    pub fn new(
        credentials: Arc<C>,
        refresh_tokens: Arc<R>,
        hasher: Arc<H>,
        codec: Arc<TokenCodec>,
        config: &IdentityConfig,
        events: mpsc::UnboundedSender<RegistrationEvent>,
    ) -> Self {
        Self {
            credentials,
            refresh_tokens,
            hasher,
            codec,
            events,
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            secure_cookies: config.cookies_secure(),
        }
    }

    /// Authenticate a customer and mint both session artifacts.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotFound`] if no identity matches the email
    /// - [`AuthError::NotEnabled`] if the email is not verified yet
    /// - [`AuthError::BadCredentials`] if the password does not verify
    pub async fn login(&self, email: &str, password: &str) -> Result<SessionCookies, AuthError> {
        let email = Email::parse(email)?;
        tracing::info!(email = %email, "login attempt");

        let identity = self
            .credentials
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !identity.enabled {
            tracing::warn!(email = %email, "login rejected: account not verified");
            return Err(AuthError::NotEnabled);
        }

        if !self.hasher.verify(password, &identity.password_hash)? {
            tracing::warn!(email = %email, "login rejected: bad credentials");
            return Err(AuthError::BadCredentials);
        }

        let access_token = self.codec.sign_access(&identity.email, identity.role)?;
        let refresh_token = self.obtain_refresh_token(&identity).await?;

        tracing::info!(email = %email, "login successful");
        Ok(SessionCookies {
            access: SessionCookie::bearer(
                ACCESS_COOKIE,
                access_token,
                self.access_ttl,
                self.secure_cookies,
            ),
            refresh: SessionCookie::bearer(
                REFRESH_COOKIE,
                refresh_token,
                self.refresh_ttl,
                self.secure_cookies,
            ),
        })
    }

    /// Register a new customer account.
    ///
    /// The identity is persisted disabled with the Customer role; a
    /// registration event is emitted for the verification dispatcher
    /// after the write commits. No tokens are issued - the account
    /// cannot log in until verified.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AlreadyExists`] if the email is taken
    /// - [`AuthError::InvalidEmail`] / [`AuthError::InvalidUsername`] /
    ///   [`AuthError::WeakPassword`] on input validation
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<RegisterReceipt, AuthError> {
        let email = Email::parse(email)?;
        let username = Username::parse(username)?;
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword {
                min: MIN_PASSWORD_LENGTH,
            });
        }

        tracing::info!(email = %email, "registration attempt");

        if self.credentials.email_exists(&email).await? {
            tracing::warn!(email = %email, "registration rejected: email already exists");
            return Err(AuthError::AlreadyExists);
        }

        let password_hash = self.hasher.hash(password)?;
        let identity = self
            .credentials
            .insert(NewIdentity {
                email,
                username: username.clone(),
                password_hash,
                role: Role::Customer,
                enabled: false,
            })
            .await?;
        tracing::info!(email = %identity.email, role = %identity.role, "identity persisted");

        // Fire-and-forget: verification delivery must never fail a
        // registration that already committed.
        let event = RegistrationEvent {
            email: identity.email.clone(),
        };
        if self.events.send(event).is_err() {
            tracing::warn!(
                email = %identity.email,
                "registration event dropped: no verification dispatcher running"
            );
        }

        Ok(RegisterReceipt {
            username,
            email: identity.email,
            message: "A verification email has been sent to your address".to_string(),
        })
    }

    /// Exchange a refresh artifact for a fresh access artifact.
    ///
    /// Pure read plus token mint: the refresh record is left untouched.
    /// The owning identity must still exist so a deleted account cannot
    /// keep minting access tokens from a stale record.
    ///
    /// # Errors
    ///
    /// - [`AuthError::BadRequest`] if no artifact was presented
    /// - [`AuthError::InvalidToken`] if the record is unknown, expired,
    ///   or orphaned
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<SessionCookie, AuthError> {
        let token = refresh_token.ok_or(AuthError::BadRequest)?;

        let record = self
            .refresh_tokens
            .find_by_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if !record.is_live(Utc::now()) {
            tracing::warn!(user_id = %record.user_id, "refresh rejected: record expired");
            return Err(AuthError::InvalidToken);
        }

        let identity = self
            .credentials
            .find_by_id(record.user_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        // `enabled` is deliberately not re-checked here; see DESIGN.md.
        let access_token = self.codec.sign_access(&identity.email, identity.role)?;
        tracing::debug!(email = %identity.email, "access token refreshed");

        Ok(SessionCookie::bearer(
            ACCESS_COOKIE,
            access_token,
            self.access_ttl,
            self.secure_cookies,
        ))
    }

    /// End the session behind a refresh artifact.
    ///
    /// Deleting a record that is already gone is a no-op, so logout is
    /// idempotent. Always returns the clearing cookie pair for the
    /// edge to attach.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] only if the store itself fails.
    pub async fn logout(&self, refresh_token: Option<&str>) -> Result<SessionCookies, AuthError> {
        if let Some(token) = refresh_token {
            let removed = self.refresh_tokens.delete_by_token(token).await?;
            tracing::info!(removed, "logout");
        }
        Ok(SessionCookies::cleared(self.secure_cookies))
    }

    /// Explicitly invalidate a refresh token by value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotFound`] if no record matches.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        if self.refresh_tokens.delete_by_token(token).await? {
            tracing::info!("refresh token revoked");
            Ok(())
        } else {
            Err(AuthError::NotFound)
        }
    }

    /// Reuse the identity's live refresh record, or replace an expired
    /// one. At most one write to the refresh store.
    async fn obtain_refresh_token(&self, identity: &Identity) -> Result<String, AuthError> {
        if let Some(record) = self.refresh_tokens.find_by_user(identity.id).await? {
            if record.is_live(Utc::now()) {
                return Ok(record.token);
            }
            self.refresh_tokens.delete_by_token(&record.token).await?;
        }

        let record = RefreshRecord::issue(identity.id, self.refresh_ttl);
        let token = record.token.clone();
        self.refresh_tokens.save(record).await?;
        Ok(token)
    }
}
