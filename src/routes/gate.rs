//! Session gate: resolves the admin session from the session cookie.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};

use crate::config::Config;
use crate::error::{DiaryError, Result};
use crate::models::Session;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "sdiary_session";

/// The session state of the current request. Any lookup failure counts as signed out.
#[derive(Debug, Clone, Default)]
pub struct SessionGate {
    /// Raw cookie token, present even if it no longer maps to a session.
    pub token: Option<String>,
    pub session: Option<Session>,
}

impl FromRequestParts<AppState> for SessionGate {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Self::default());
        };

        let session = match state.auth.current_session(&token).await {
            Ok(session) => session,
            Err(err) => {
                tracing::warn!(error = %err, "session lookup failed, treating as signed out");
                None
            }
        };
        if session.is_none() {
            tracing::debug!("stale or unknown session cookie");
        }

        Ok(Self {
            token: Some(token),
            session,
        })
    }
}

/// Extract the session token from the request's `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a new session token.
pub fn session_cookie(config: &Config, token: &str) -> Result<(axum::http::HeaderName, HeaderValue)> {
    cookie(config, token, config.session_ttl.num_seconds().max(0))
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(config: &Config) -> Result<(axum::http::HeaderName, HeaderValue)> {
    cookie(config, "", 0)
}

fn cookie(config: &Config, value: &str, max_age: i64) -> Result<(axum::http::HeaderName, HeaderValue)> {
    let secure = if config.secure_cookies() { "; Secure" } else { "" };
    let raw = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}{}",
        SESSION_COOKIE, value, max_age, secure
    );
    let value = HeaderValue::from_str(&raw).map_err(|e| DiaryError::InvalidInput(e.to_string()))?;
    Ok((SET_COOKIE, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn finds_session_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; sdiary_session=abc123"));
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_or_empty_cookie() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.append(COOKIE, HeaderValue::from_static("sdiary_session="));
        assert_eq!(session_token(&headers), None);
    }

    #[test]
    fn cookie_attributes() {
        let mut config = Config::local(PathBuf::from(":memory:"));
        let (_, value) = session_cookie(&config, "tok").unwrap();
        let value = value.to_str().unwrap();
        assert!(value.starts_with("sdiary_session=tok;"));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Max-Age=604800"));
        assert!(!value.contains("Secure"));

        config.public_url = "https://diary.example.com".to_string();
        let (_, value) = clear_session_cookie(&config).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.contains("Max-Age=0"));
        assert!(value.ends_with("; Secure"));
    }
}
