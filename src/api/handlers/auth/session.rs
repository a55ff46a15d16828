//! Session cookie handling and the logout endpoint.

use axum::{
    extract::Extension,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::error;

use super::{
    state::{AuthConfig, AuthState},
    types::MessageResponse,
    utils::cookie_value,
};
use crate::api::handlers::error::ErrorResponse;

pub(crate) const SESSION_COOKIE_NAME: &str = "access_token";

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Session cookie cleared", body = MessageResponse),
        (status = 403, description = "Missing or invalid CSRF token", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Tokens are stateless; overwriting the cookie is the whole logout.
    let mut response_headers = HeaderMap::new();
    match clear_session_cookie(auth_state.config()) {
        Ok(cookie) => {
            response_headers.insert(SET_COOKIE, cookie);
        }
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    (StatusCode::OK, response_headers, Json(MessageResponse::ok()))
}

/// Build the `HttpOnly` cookie carrying the session token.
pub(super) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=None");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(super) fn clear_session_cookie(config: &AuthConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie =
        format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=None; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Session token from the `access_token` cookie, else from `Authorization: Bearer`.
pub(super) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE_NAME).or_else(|| extract_bearer_token(headers))
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use axum::http::header::COOKIE;

    fn config() -> AuthConfig {
        AuthConfig::new("http://localhost:3000".to_string())
    }

    #[test]
    fn session_cookie_is_secure_by_default() -> Result<()> {
        let cookie = session_cookie(&config(), "tok")?;
        assert_eq!(
            cookie.to_str()?,
            "access_token=tok; Path=/; HttpOnly; SameSite=None; Secure"
        );
        Ok(())
    }

    #[test]
    fn insecure_override_drops_only_secure() -> Result<()> {
        let cookie = session_cookie(&config().with_session_cookie_secure(false), "tok")?;
        assert_eq!(
            cookie.to_str()?,
            "access_token=tok; Path=/; HttpOnly; SameSite=None"
        );
        Ok(())
    }

    #[test]
    fn clear_cookie_expires_immediately() -> Result<()> {
        let cookie = clear_session_cookie(&config())?;
        let value = cookie.to_str()?;
        assert!(value.starts_with("access_token=;"));
        assert!(value.contains("Max-Age=0"));
        assert!(value.contains("HttpOnly"));
        Ok(())
    }

    #[test]
    fn extract_prefers_cookie_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("access_token=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn extract_falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("access_token="));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(
            extract_session_token(&headers).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn extract_rejects_empty_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(extract_session_token(&headers), None);
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(extract_session_token(&headers), None);
    }
}
