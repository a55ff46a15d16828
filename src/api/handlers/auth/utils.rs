//! Small helpers for auth input validation and cookie handling.

use anyhow::{Context, Result};
use axum::http::{header::COOKIE, HeaderMap};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use regex::Regex;

use super::{password::MAX_PASSWORD_BYTES, types::AuthRequest};
use crate::api::handlers::error::ApiError;

pub(super) const MIN_PASSWORD_LEN: usize = 5;

/// Normalize an email for lookup/uniqueness checks.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email format check on already-normalized input.
pub(super) fn valid_email(email_normalized: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|regex| regex.is_match(email_normalized))
}

pub(super) fn valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN && password.len() <= MAX_PASSWORD_BYTES
}

/// Shape check for signup/login bodies. Runs before any store or hashing work.
pub(super) fn validate_auth_request(request: &AuthRequest) -> Result<(), ApiError> {
    if !valid_email(&normalize_email(&request.email)) {
        return Err(ApiError::BadRequest("email must be an email".to_string()));
    }
    if request.password.len() > MAX_PASSWORD_BYTES {
        return Err(ApiError::BadRequest(format!(
            "password must be shorter than or equal to {MAX_PASSWORD_BYTES} bytes"
        )));
    }
    if !valid_password(&request.password) {
        return Err(ApiError::BadRequest(format!(
            "password must be longer than or equal to {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Read a cookie by name across every `Cookie` header. Empty values count as absent.
pub(super) fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `len` random bytes from the OS, base64url encoded without padding.
pub(super) fn random_token(len: usize) -> Result<String> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to gather random bytes")?;
    Ok(Base64UrlUnpadded::encode_string(&bytes))
}
