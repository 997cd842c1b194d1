//! Cookie-shaped bearer artifacts.
//!
//! Both session artifacts travel as HTTP-only cookies scoped to the
//! whole API path. This module only builds the `Set-Cookie` values;
//! attaching them to responses is the edge's job.

use std::time::Duration;

/// Cookie name carrying the signed access token.
pub const ACCESS_COOKIE: &str = "Access-Token";
/// Cookie name carrying the opaque refresh token.
pub const REFRESH_COOKIE: &str = "Refresh-Token";

/// A single `Set-Cookie` artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    /// Cookie name.
    pub name: &'static str,
    /// Cookie value (the bearer artifact; empty when clearing).
    pub value: String,
    /// Max-Age in whole seconds. Zero clears the cookie.
    pub max_age_secs: u64,
    /// Whether to emit the `Secure` attribute.
    pub secure: bool,
}

impl SessionCookie {
    /// Build a live cookie holding a bearer artifact.
    #[must_use]
    pub fn bearer(name: &'static str, value: String, max_age: Duration, secure: bool) -> Self {
        Self {
            name,
            value,
            max_age_secs: max_age.as_secs(),
            secure,
        }
    }

    /// Build a clearing cookie (`Max-Age=0`, empty value) for logout.
    #[must_use]
    pub const fn cleared(name: &'static str, secure: bool) -> Self {
        Self {
            name,
            value: String::new(),
            max_age_secs: 0,
            secure,
        }
    }

    /// Render the `Set-Cookie` header value.
    ///
    /// Always HTTP-only and path-scoped to `/`, so scripts cannot read
    /// either artifact and every API route sees both.
    #[must_use]
    pub fn header_value(&self) -> String {
        let mut header = format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly",
            self.name, self.value, self.max_age_secs
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// The pair of artifacts minted by a successful login.
#[derive(Debug, Clone)]
pub struct SessionCookies {
    /// Short-lived signed access artifact.
    pub access: SessionCookie,
    /// Long-lived opaque refresh artifact.
    pub refresh: SessionCookie,
}

impl SessionCookies {
    /// The clearing pair returned by logout.
    #[must_use]
    pub const fn cleared(secure: bool) -> Self {
        Self {
            access: SessionCookie::cleared(ACCESS_COOKIE, secure),
            refresh: SessionCookie::cleared(REFRESH_COOKIE, secure),
        }
    }
}
