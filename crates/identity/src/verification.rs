//! Email-verification handshake.
//!
//! Registration publishes a [`RegistrationEvent`]; the dispatcher
//! consumes it off the request path, mints a purpose-scoped token,
//! renders the verification email, and hands it to the mail sender.
//! Delivery is best-effort: template and transport failures are logged
//! and swallowed, never propagated back to the registration call that
//! already committed.
//!
//! The other half, [`VerificationDispatcher::handle_verification`], is
//! the synchronous handler behind the link in the email. It flips
//! `enabled` exactly once; a replayed token lands on the benign
//! `AlreadyVerified` outcome because the identity is already enabled,
//! not because the token was consumed.

use std::sync::Arc;

use askama::Template;
use thiserror::Error;
use tokio::sync::mpsc;

use greenfig_core::Email;

use crate::error::AuthError;
use crate::mailer::{MailError, Mailer};
use crate::store::CredentialStore;
use crate::token::{EMAIL_VERIFICATION_PURPOSE, TokenCodec, TokenError};

/// Published after an identity is persisted at registration.
#[derive(Debug, Clone)]
pub struct RegistrationEvent {
    /// Email of the freshly registered identity.
    pub email: Email,
}

/// Result of handling a verification link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationOutcome {
    /// The account was enabled by this call.
    Verified,
    /// The account was already enabled. Benign, not an error.
    AlreadyVerified,
}

/// HTML body of the verification email.
#[derive(Template)]
#[template(path = "email/verify_account.html")]
struct VerifyAccountHtml<'a> {
    verification_url: &'a str,
}

/// Plain-text body of the verification email.
#[derive(Template)]
#[template(path = "email/verify_account.txt")]
struct VerifyAccountText<'a> {
    verification_url: &'a str,
}

#[derive(Debug, Error)]
enum DispatchError {
    #[error("token error: {0}")]
    Token(#[from] TokenError),
    #[error("template error: {0}")]
    Template(#[from] askama::Error),
    #[error("mail error: {0}")]
    Mail(#[from] MailError),
}

/// Mints verification tokens and reacts to registration events.
pub struct VerificationDispatcher<C, M> {
    credentials: Arc<C>,
    mailer: Arc<M>,
    codec: Arc<TokenCodec>,
    verify_endpoint: String,
}

impl<C, M> VerificationDispatcher<C, M>
where
    C: CredentialStore + 'static,
    M: Mailer + 'static,
{
    /// Build a dispatcher. `base_url` is the public URL the
    /// verification link is rooted at.
    #[must_use]
    pub fn new(credentials: Arc<C>, mailer: Arc<M>, codec: Arc<TokenCodec>, base_url: &str) -> Self {
        Self {
            credentials,
            mailer,
            codec,
            verify_endpoint: format!("{}/api/auth/verify", base_url.trim_end_matches('/')),
        }
    }

    /// Consume registration events until the sender side is dropped.
    ///
    /// Run this on its own task; each event is dispatched to the mail
    /// sender with at-least-once intent and failures swallowed.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<RegistrationEvent>) {
        while let Some(event) = events.recv().await {
            self.dispatch(event).await;
        }
        tracing::debug!("registration event channel closed, dispatcher stopping");
    }

    /// Handle a single registration event: best-effort email dispatch.
    pub async fn dispatch(&self, event: RegistrationEvent) {
        if let Err(error) = self.send_verification_email(&event.email).await {
            tracing::error!(email = %event.email, %error, "failed to send verification email");
        } else {
            tracing::info!(email = %event.email, "verification email sent");
        }
    }

    async fn send_verification_email(&self, email: &Email) -> Result<(), DispatchError> {
        let token = self.codec.sign_verification(email)?;
        let verification_url = format!("{}?token={token}", self.verify_endpoint);

        let html = VerifyAccountHtml {
            verification_url: &verification_url,
        }
        .render()?;
        let text = VerifyAccountText {
            verification_url: &verification_url,
        }
        .render()?;

        self.mailer
            .send(email, "Verify your Green Fig account", &text, &html)
            .await?;
        Ok(())
    }

    /// Handle the verification link from the email.
    ///
    /// # Errors
    ///
    /// - [`AuthError::Token`] if the token fails signature, expiry, or
    ///   parse checks
    /// - [`AuthError::WrongPurpose`] if the purpose claim is not the
    ///   email-verification tag (an access token replayed here is
    ///   rejected even with a valid signature)
    /// - [`AuthError::NotFound`] if no identity matches the subject
    /// - [`AuthError::Store`] if persistence fails
    pub async fn handle_verification(&self, token: &str) -> Result<VerificationOutcome, AuthError> {
        let claims = self.codec.verify(token)?;

        if claims.purpose.as_deref() != Some(EMAIL_VERIFICATION_PURPOSE) {
            tracing::warn!(purpose = ?claims.purpose, "verification token with wrong purpose");
            return Err(AuthError::WrongPurpose);
        }

        // The subject came out of a token we signed; failing to parse
        // it back means the token is junk, not that the caller erred.
        let email = Email::parse(&claims.sub).map_err(|_| AuthError::Token(TokenError::Malformed))?;

        let mut identity = self
            .credentials
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::NotFound)?;

        if identity.enabled {
            tracing::info!(email = %email, "email already verified");
            return Ok(VerificationOutcome::AlreadyVerified);
        }

        identity.enabled = true;
        self.credentials.update(&identity).await?;
        tracing::info!(email = %email, "email verified");

        Ok(VerificationOutcome::Verified)
    }
}
