//! Credential hashing with bcrypt.
//!
//! Hashing and verification run on the blocking pool so a login burst does not
//! stall other requests on the runtime workers. Passwords longer than
//! [`MAX_PASSWORD_BYTES`] are refused rather than truncated.

use anyhow::{Context, Result};
use tokio::sync::OnceCell;

pub const DEFAULT_BCRYPT_COST: u32 = 12;

/// bcrypt only reads this many bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

pub struct CredentialHasher {
    cost: u32,
    // Verified against when the email is unknown so both paths pay a bcrypt round.
    dummy_hash: OnceCell<String>,
}

impl CredentialHasher {
    #[must_use]
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Hash a plaintext password with a fresh salt.
    ///
    /// # Errors
    /// Fails if the password exceeds [`MAX_PASSWORD_BYTES`], bcrypt rejects the
    /// cost or the blocking task panics.
    pub async fn hash(&self, plaintext: &str) -> Result<String> {
        let plaintext = plaintext.to_owned();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::non_truncating_hash(plaintext, cost))
            .await
            .context("password hashing task failed")?
            .context("failed to hash password")
    }

    /// Compare a plaintext password against a stored hash.
    ///
    /// A malformed hash, or a password bcrypt would have to truncate, verifies
    /// as `false`.
    ///
    /// # Errors
    /// Fails only if the blocking task panics.
    pub async fn verify(&self, plaintext: &str, hashed: &str) -> Result<bool> {
        let plaintext = plaintext.to_owned();
        let hashed = hashed.to_owned();
        tokio::task::spawn_blocking(move || {
            bcrypt::non_truncating_verify(plaintext, &hashed).unwrap_or(false)
        })
        .await
        .context("password verification task failed")
    }

    /// Spend a verification against a throwaway hash.
    ///
    /// # Errors
    /// Fails if the throwaway hash cannot be produced.
    pub async fn verify_dummy(&self, plaintext: &str) -> Result<()> {
        let hashed = self
            .dummy_hash
            .get_or_try_init(|| self.hash("taskgate-dummy-password"))
            .await?;
        self.verify(plaintext, hashed).await?;
        Ok(())
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}
