//! Green Fig Identity - authentication and session lifecycle.
//!
//! This crate owns the one subsystem of the store backend with real
//! protocol complexity: password login, short-lived signed access
//! tokens, long-lived rotating refresh tokens, revocation, and the
//! asynchronous email-verification handshake that gates account
//! activation.
//!
//! # Architecture
//!
//! - [`token`] - Stateless JWT codec (HS256) for access and
//!   verification claims
//! - [`session`] - The session manager: login, register, refresh,
//!   logout, revoke
//! - [`verification`] - Registration-triggered verification email
//!   dispatch and the verification handler
//! - [`store`] - Credential and refresh-token store traits, with
//!   in-memory adapters and a moka-backed lookup cache
//! - [`hash`] - Pluggable password hashing (Argon2id by default)
//! - [`mailer`] - Mail sender trait plus the SMTP adapter
//! - [`cookie`] - Cookie-shaped bearer artifacts handed to the edge
//!
//! Requests are authorized statelessly: a valid access token needs no
//! store lookup. Revocation works through the refresh path instead -
//! deleting the server-side refresh record caps how long a stolen
//! access token stays useful at the access TTL.
//!
//! The HTTP layer, persistence engines, and mail transport are
//! collaborators behind traits; this crate never touches a socket on
//! the request path.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod cookie;
pub mod error;
pub mod hash;
pub mod mailer;
pub mod models;
pub mod session;
pub mod store;
pub mod token;
pub mod verification;

pub use config::{ConfigError, IdentityConfig, SmtpConfig};
pub use cookie::{SessionCookie, SessionCookies};
pub use error::{AuthError, ErrorClass};
pub use hash::{Argon2Hasher, HashError, PasswordHasher};
pub use mailer::{MailError, Mailer, SmtpMailer};
pub use models::{Identity, NewIdentity, RefreshRecord, RegisterReceipt};
pub use session::SessionManager;
pub use store::{CredentialStore, RefreshTokenStore, StoreError};
pub use token::{Claims, TokenCodec, TokenError};
pub use verification::{RegistrationEvent, VerificationDispatcher, VerificationOutcome};
