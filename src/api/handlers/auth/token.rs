//! Session token issuing and verification (HS256 JWT).

use anyhow::{Context, Result};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use uuid::Uuid;

pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 120 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// The only verification failure callers ever see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidToken;

impl fmt::Display for InvalidToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("invalid session token")
    }
}

impl std::error::Error for InvalidToken {}

pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl_seconds: i64,
}

impl TokenIssuer {
    #[must_use]
    pub fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl_seconds,
        }
    }

    #[must_use]
    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    /// Issue a token for `subject`, valid from now.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue(&self, subject: Uuid, email: &str) -> Result<String> {
        self.issue_at(subject, email, chrono::Utc::now().timestamp())
    }

    /// Issue a token as if it had been minted at `issued_at` (unix seconds).
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_at(&self, subject: Uuid, email: &str, issued_at: i64) -> Result<String> {
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            iat: issued_at,
            exp: issued_at + self.ttl_seconds,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("failed to sign session token")
    }

    /// Check signature, expiry and shape.
    ///
    /// # Errors
    /// Every failure is reported as [`InvalidToken`].
    pub fn verify(&self, token: &str) -> Result<Claims, InvalidToken> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!("session token rejected: {err}");
                InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    #[test]
    fn issue_then_verify_returns_claims() -> Result<()> {
        let issuer = TokenIssuer::new(SECRET, DEFAULT_TOKEN_TTL_SECONDS);
        let id = Uuid::new_v4();
        let token = issuer.issue(id, "alice@example.com")?;

        let claims = issuer.verify(&token)?;
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 7200);
        Ok(())
    }

    #[test]
    fn expired_token_is_invalid() -> Result<()> {
        let issuer = TokenIssuer::new(SECRET, DEFAULT_TOKEN_TTL_SECONDS);
        let issued_at = chrono::Utc::now().timestamp() - DEFAULT_TOKEN_TTL_SECONDS - 1;
        let token = issuer.issue_at(Uuid::new_v4(), "alice@example.com", issued_at)?;
        assert_eq!(issuer.verify(&token), Err(InvalidToken));
        Ok(())
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() -> Result<()> {
        let issuer = TokenIssuer::new(SECRET, DEFAULT_TOKEN_TTL_SECONDS);
        let other = TokenIssuer::new(b"ffffffffffffffffffffffffffffffff", DEFAULT_TOKEN_TTL_SECONDS);
        let token = other.issue(Uuid::new_v4(), "alice@example.com")?;
        assert_eq!(issuer.verify(&token), Err(InvalidToken));
        Ok(())
    }

    #[test]
    fn garbage_is_invalid() {
        let issuer = TokenIssuer::new(SECRET, DEFAULT_TOKEN_TTL_SECONDS);
        assert_eq!(issuer.verify(""), Err(InvalidToken));
        assert_eq!(issuer.verify("not.a.jwt"), Err(InvalidToken));
    }

    #[test]
    fn tampered_payload_is_invalid() -> Result<()> {
        let issuer = TokenIssuer::new(SECRET, DEFAULT_TOKEN_TTL_SECONDS);
        let token = issuer.issue(Uuid::new_v4(), "alice@example.com")?;
        let forged = issuer.issue(Uuid::new_v4(), "mallory@example.com")?;

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        parts[1] = forged_parts[1];
        assert_eq!(issuer.verify(&parts.join(".")), Err(InvalidToken));
        Ok(())
    }
}
