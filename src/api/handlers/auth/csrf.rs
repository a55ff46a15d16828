//! Double-submit CSRF protection.
//!
//! Flow Overview: `GET /auth/csrf` seeds an `HttpOnly` `_csrf` secret cookie and
//! returns a token `salt.mac` where `mac = HMAC-SHA256(key, salt || secret)`.
//! Every mutating request must echo a token in the `csrf-token` header that
//! verifies against the secret cookie sent with that same request. The secret
//! is never readable by scripts, so a cross-site page cannot mint a token.

use axum::{
    extract::{Extension, Request},
    http::{
        header::{InvalidHeaderValue, SET_COOKIE},
        HeaderMap, HeaderValue, Method,
    },
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretSlice};
use sha2::Sha256;
use std::sync::Arc;
use tracing::warn;

use super::{
    state::{AuthConfig, AuthState},
    types::CsrfResponse,
    utils::{cookie_value, random_token},
};
use crate::api::handlers::error::ApiError;

pub(crate) const CSRF_COOKIE_NAME: &str = "_csrf";
pub(crate) const CSRF_HEADER_NAME: &str = "csrf-token";

const SECRET_LEN: usize = 32;
const SALT_LEN: usize = 16;

type HmacSha256 = Hmac<Sha256>;

pub struct CsrfGuard {
    key: SecretSlice<u8>,
}

impl CsrfGuard {
    #[must_use]
    pub fn new(key: &[u8]) -> Self {
        Self {
            key: SecretSlice::from(key.to_vec()),
        }
    }

    /// Mint a fresh per-client secret.
    ///
    /// # Errors
    /// Returns an error if the OS random source fails.
    pub fn new_secret(&self) -> anyhow::Result<String> {
        random_token(SECRET_LEN)
    }

    /// Derive a token from `secret` with a fresh salt.
    ///
    /// # Errors
    /// Returns an error if the OS random source fails.
    pub fn issue_token(&self, secret: &str) -> anyhow::Result<String> {
        let salt = random_token(SALT_LEN)?;
        let mac = self.mac(&salt, secret)?.finalize().into_bytes();
        Ok(format!("{salt}.{}", Base64UrlUnpadded::encode_string(&mac)))
    }

    /// Constant-time check of `token` against `secret`.
    #[must_use]
    pub fn verify_token(&self, secret: &str, token: &str) -> bool {
        let Some((salt, tag)) = token.split_once('.') else {
            return false;
        };
        if salt.is_empty() {
            return false;
        }
        let Ok(tag) = Base64UrlUnpadded::decode_vec(tag) else {
            return false;
        };
        self.mac(salt, secret)
            .is_ok_and(|mac| mac.verify_slice(&tag).is_ok())
    }

    fn mac(&self, salt: &str, secret: &str) -> anyhow::Result<HmacSha256> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.key.expose_secret())
            .map_err(|err| anyhow::anyhow!("invalid csrf key: {err}"))?;
        mac.update(salt.as_bytes());
        mac.update(secret.as_bytes());
        Ok(mac)
    }
}

fn csrf_cookie(config: &AuthConfig, secret: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{CSRF_COOKIE_NAME}={secret}; Path=/; HttpOnly; SameSite=None");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

#[utoipa::path(
    get,
    path = "/auth/csrf",
    responses(
        (status = 200, description = "CSRF token for the current secret cookie", body = CsrfResponse)
    ),
    tag = "auth"
)]
pub async fn csrf_token(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Response, ApiError> {
    let guard = auth_state.csrf();
    let mut response_headers = HeaderMap::new();

    let secret = match cookie_value(&headers, CSRF_COOKIE_NAME) {
        Some(secret) => secret,
        None => {
            let secret = guard.new_secret()?;
            let cookie = csrf_cookie(auth_state.config(), &secret)
                .map_err(|err| anyhow::anyhow!("failed to build csrf cookie: {err}"))?;
            response_headers.insert(SET_COOKIE, cookie);
            secret
        }
    };

    let csrf_token = guard.issue_token(&secret)?;
    Ok((response_headers, Json(CsrfResponse { csrf_token })).into_response())
}

fn is_mutating(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Reject mutating requests whose `csrf-token` header does not match the `_csrf` cookie.
pub async fn require_csrf(
    auth_state: Extension<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    if !is_mutating(request.method()) {
        return next.run(request).await;
    }

    let headers = request.headers();
    let secret = cookie_value(headers, CSRF_COOKIE_NAME);
    let token = headers
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok())
        .map(str::trim);

    let valid = match (secret, token) {
        (Some(secret), Some(token)) => auth_state.csrf().verify_token(&secret, token),
        _ => false,
    };
    if !valid {
        warn!(
            method = %request.method(),
            path = %request.uri().path(),
            "csrf check failed"
        );
        return ApiError::Forbidden("invalid csrf token").into_response();
    }

    next.run(request).await
}
