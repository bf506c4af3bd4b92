//! Admin authentication.
//!
//! Handlers never look at passwords or cookies directly: they take an
//! [`AdminSession`] extractor, which asks the configured [`Authenticator`]
//! whether the request's session cookie is valid.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, header};
use uuid::Uuid;

use super::AppState;
use super::error::ServerError;

/// Capability check for admin requests.
pub trait Authenticator: Send + Sync {
    /// Exchange a password for a session token, or `None` if it is wrong.
    fn login(&self, password: &str) -> Option<String>;

    /// Whether `token` (the session cookie value) belongs to an operator.
    fn is_authenticated(&self, token: &str) -> bool;
}

/// Single shared admin password.
///
/// A random session token is drawn once per process and handed out on
/// every successful login, so restarting the server logs everyone out.
pub struct PasswordAuthenticator {
    password: String,
    session_token: String,
}

impl PasswordAuthenticator {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            session_token: Uuid::new_v4().simple().to_string(),
        }
    }
}

impl Authenticator for PasswordAuthenticator {
    fn login(&self, password: &str) -> Option<String> {
        constant_time_eq(password.as_bytes(), self.password.as_bytes())
            .then(|| self.session_token.clone())
    }

    fn is_authenticated(&self, token: &str) -> bool {
        constant_time_eq(token.as_bytes(), self.session_token.as_bytes())
    }
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Marker extracted only for requests carrying a valid session cookie.
pub struct AdminSession;

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ServerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match cookie_value(&parts.headers, &state.cookie_name) {
            Some(token) if state.auth.is_authenticated(token) => Ok(AdminSession),
            _ => Err(ServerError::Unauthenticated),
        }
    }
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// `Set-Cookie` value that stores the session token.
pub fn session_cookie(name: &str, token: &str) -> String {
    format!("{name}={token}; Path=/; HttpOnly; SameSite=Lax")
}

/// `Set-Cookie` value that clears the session.
pub fn clear_cookie(name: &str) -> String {
    format!("{name}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
