//! Integration tests for the full identity lifecycle.
//!
//! These wire the session manager, verification dispatcher, cached
//! credential store, and token codec together the way the running
//! service does, with only the SMTP transport replaced by a capturing
//! fake.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use tokio::sync::{Mutex, mpsc};

use greenfig_core::{Email, Role};
use greenfig_identity::store::CachedCredentialStore;
use greenfig_identity::store::memory::{InMemoryCredentialStore, InMemoryRefreshTokenStore};
use greenfig_identity::{
    AuthError, ErrorClass, IdentityConfig, MailError, Mailer, RegistrationEvent, SessionManager,
    TokenCodec, VerificationDispatcher, VerificationOutcome,
};

type Credentials = CachedCredentialStore<InMemoryCredentialStore>;

/// Captures outgoing mail instead of delivering it.
#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<String>>,
}

#[async_trait]
impl Mailer for CapturingMailer {
    async fn send(
        &self,
        _to: &Email,
        _subject: &str,
        text_body: &str,
        _html_body: &str,
    ) -> Result<(), MailError> {
        self.sent.lock().await.push(text_body.to_string());
        Ok(())
    }
}

struct Stack {
    manager: SessionManager<Credentials, InMemoryRefreshTokenStore, greenfig_identity::Argon2Hasher>,
    dispatcher: VerificationDispatcher<Credentials, CapturingMailer>,
    mailer: Arc<CapturingMailer>,
    codec: Arc<TokenCodec>,
    events: mpsc::UnboundedReceiver<RegistrationEvent>,
}

fn stack_with_base_url(base_url: &str) -> Stack {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let config = IdentityConfig {
        signing_secret: SecretString::from("0123456789abcdef0123456789abcdef".to_string()),
        access_ttl: Duration::from_secs(900),
        refresh_ttl: Duration::from_secs(604_800),
        verification_ttl: Duration::from_secs(86_400),
        base_url: base_url.to_string(),
        smtp: None,
    };

    let credentials = Arc::new(CachedCredentialStore::new(
        InMemoryCredentialStore::new(),
        1_000,
        Duration::from_secs(300),
    ));
    let refresh_tokens = Arc::new(InMemoryRefreshTokenStore::new());
    let codec = Arc::new(TokenCodec::from_config(&config));
    let mailer = Arc::new(CapturingMailer::default());
    let (tx, rx) = mpsc::unbounded_channel();

    let manager = SessionManager::new(
        Arc::clone(&credentials),
        refresh_tokens,
        Arc::new(greenfig_identity::Argon2Hasher),
        Arc::clone(&codec),
        &config,
        tx,
    );
    let dispatcher = VerificationDispatcher::new(
        credentials,
        Arc::clone(&mailer),
        Arc::clone(&codec),
        &config.base_url,
    );

    Stack {
        manager,
        dispatcher,
        mailer,
        codec,
        events: rx,
    }
}

fn stack() -> Stack {
    stack_with_base_url("http://localhost:8080")
}

/// Pull the verification token out of a captured email body.
fn token_from_email(body: &str) -> String {
    body.split("token=")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .map(ToString::to_string)
        .expect("email should contain a verification link")
}

// =============================================================================
// Full Lifecycle
// =============================================================================

#[tokio::test]
async fn test_register_verify_login_refresh_logout() {
    let mut stack = stack();

    // Register. No tokens come back, only a receipt.
    let receipt = stack
        .manager
        .register("shopper@greenfig.shop", "shopper", "hunter2hunter2")
        .await
        .expect("registration should succeed");
    assert_eq!(receipt.email.as_str(), "shopper@greenfig.shop");

    // Login before verification is refused with the distinct class.
    let err = stack
        .manager
        .login("shopper@greenfig.shop", "hunter2hunter2")
        .await
        .expect_err("unverified account must not log in");
    assert!(matches!(err, AuthError::NotEnabled));
    assert_eq!(err.class(), ErrorClass::Forbidden);

    // Deliver the verification email and follow its link.
    let event = stack.events.recv().await.expect("registration event");
    stack.dispatcher.dispatch(event).await;
    let body = stack.mailer.sent.lock().await.first().cloned().unwrap();
    let token = token_from_email(&body);

    let outcome = stack.dispatcher.handle_verification(&token).await.unwrap();
    assert_eq!(outcome, VerificationOutcome::Verified);

    // Replaying the link is benign.
    let outcome = stack.dispatcher.handle_verification(&token).await.unwrap();
    assert_eq!(outcome, VerificationOutcome::AlreadyVerified);

    // Login now mints both artifacts as HTTP-only cookies.
    let cookies = stack
        .manager
        .login("shopper@greenfig.shop", "hunter2hunter2")
        .await
        .expect("verified account should log in");
    assert!(
        cookies
            .access
            .header_value()
            .starts_with("Access-Token=")
    );
    assert!(cookies.access.header_value().contains("HttpOnly"));
    assert!(cookies.refresh.header_value().contains("Max-Age=604800"));

    let claims = stack.codec.verify(&cookies.access.value).unwrap();
    assert_eq!(claims.sub, "shopper@greenfig.shop");
    assert_eq!(claims.role, Some(Role::Customer));

    // Refresh mints a fresh access artifact from the refresh cookie.
    let refreshed = stack
        .manager
        .refresh(Some(cookies.refresh.value.as_str()))
        .await
        .unwrap();
    assert!(stack.codec.verify(&refreshed.value).is_ok());

    // Logout clears both cookies and kills the refresh path.
    let cleared = stack
        .manager
        .logout(Some(cookies.refresh.value.as_str()))
        .await
        .unwrap();
    assert_eq!(cleared.access.max_age_secs, 0);
    assert_eq!(cleared.refresh.max_age_secs, 0);

    let err = stack
        .manager
        .refresh(Some(cookies.refresh.value.as_str()))
        .await
        .expect_err("refresh after logout must fail");
    assert_eq!(err.class(), ErrorClass::Unauthorized);
}

// =============================================================================
// Refresh Token Lifecycle
// =============================================================================

#[tokio::test]
async fn test_refresh_token_shared_across_logins_until_revoked() {
    let mut stack = stack();
    stack
        .manager
        .register("shopper@greenfig.shop", "shopper", "hunter2hunter2")
        .await
        .unwrap();
    let event = stack.events.recv().await.unwrap();
    stack.dispatcher.dispatch(event).await;
    let body = stack.mailer.sent.lock().await.first().cloned().unwrap();
    stack
        .dispatcher
        .handle_verification(&token_from_email(&body))
        .await
        .unwrap();

    // Two devices logging in share the one live refresh record.
    let laptop = stack
        .manager
        .login("shopper@greenfig.shop", "hunter2hunter2")
        .await
        .unwrap();
    let phone = stack
        .manager
        .login("shopper@greenfig.shop", "hunter2hunter2")
        .await
        .unwrap();
    assert_eq!(laptop.refresh.value, phone.refresh.value);

    // Revocation cuts off both; a second revoke reports NotFound.
    stack.manager.revoke(&laptop.refresh.value).await.unwrap();
    assert!(matches!(
        stack.manager.refresh(Some(phone.refresh.value.as_str())).await,
        Err(AuthError::InvalidToken)
    ));
    assert!(matches!(
        stack.manager.revoke(&laptop.refresh.value).await,
        Err(AuthError::NotFound)
    ));

    // The next login issues a brand-new token.
    let again = stack
        .manager
        .login("shopper@greenfig.shop", "hunter2hunter2")
        .await
        .unwrap();
    assert_ne!(again.refresh.value, laptop.refresh.value);
}

// =============================================================================
// Edge Classification
// =============================================================================

#[tokio::test]
async fn test_login_failures_keep_their_classes() {
    let mut stack = stack();
    stack
        .manager
        .register("shopper@greenfig.shop", "shopper", "hunter2hunter2")
        .await
        .unwrap();
    let event = stack.events.recv().await.unwrap();
    stack.dispatcher.dispatch(event).await;
    let body = stack.mailer.sent.lock().await.first().cloned().unwrap();
    stack
        .dispatcher
        .handle_verification(&token_from_email(&body))
        .await
        .unwrap();

    let unknown = stack
        .manager
        .login("ghost@greenfig.shop", "hunter2hunter2")
        .await
        .unwrap_err();
    assert_eq!(unknown.class(), ErrorClass::NotFound);

    let wrong = stack
        .manager
        .login("shopper@greenfig.shop", "wrong-password")
        .await
        .unwrap_err();
    assert_eq!(wrong.class(), ErrorClass::Unauthorized);

    let duplicate = stack
        .manager
        .register("shopper@greenfig.shop", "other", "hunter2hunter2")
        .await
        .unwrap_err();
    assert_eq!(duplicate.class(), ErrorClass::Conflict);
}

// =============================================================================
// Cookie Security
// =============================================================================

#[tokio::test]
async fn test_https_base_url_turns_on_secure_cookies() {
    let mut stack = stack_with_base_url("https://greenfig.shop");
    stack
        .manager
        .register("shopper@greenfig.shop", "shopper", "hunter2hunter2")
        .await
        .unwrap();
    let event = stack.events.recv().await.unwrap();
    stack.dispatcher.dispatch(event).await;
    let body = stack.mailer.sent.lock().await.first().cloned().unwrap();
    assert!(body.contains("https://greenfig.shop/api/auth/verify?token="));
    stack
        .dispatcher
        .handle_verification(&token_from_email(&body))
        .await
        .unwrap();

    let cookies = stack
        .manager
        .login("shopper@greenfig.shop", "hunter2hunter2")
        .await
        .unwrap();
    assert!(cookies.access.header_value().ends_with("; Secure"));
    assert!(cookies.refresh.header_value().ends_with("; Secure"));

    let cleared = stack.manager.logout(None).await.unwrap();
    assert!(cleared.access.header_value().ends_with("; Secure"));
}

// =============================================================================
// Background Dispatcher
// =============================================================================

#[tokio::test]
async fn test_dispatcher_task_delivers_mail_off_the_request_path() {
    let stack = stack();
    let dispatcher = Arc::new(stack.dispatcher);
    let handle = tokio::spawn(Arc::clone(&dispatcher).run(stack.events));

    stack
        .manager
        .register("shopper@greenfig.shop", "shopper", "hunter2hunter2")
        .await
        .unwrap();

    // Dropping the manager closes the event channel; run() drains what
    // is queued and exits.
    drop(stack.manager);
    handle.await.unwrap();

    assert_eq!(stack.mailer.sent.lock().await.len(), 1);
}
