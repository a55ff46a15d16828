//! Signup and login orchestration over the user store, hasher and token issuer.

use anyhow::Result;
use tracing::{debug, info};
use uuid::Uuid;

use super::{state::AuthState, utils::normalize_email};
use crate::store::{CreateOutcome, UserStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupOutcome {
    Created(Uuid),
    AlreadyRegistered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(String),
    InvalidCredentials,
}

/// Register a new credential.
///
/// # Errors
/// Returns an error for hashing or store failures other than a duplicate email.
pub async fn signup(
    auth_state: &AuthState,
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<SignupOutcome> {
    let email = normalize_email(email);
    let password_hash = auth_state.hasher().hash(password).await?;

    match store.create_credential(&email, &password_hash).await? {
        CreateOutcome::Created(id) => {
            info!(user_id = %id, "user registered");
            Ok(SignupOutcome::Created(id))
        }
        CreateOutcome::UniqueViolation => {
            debug!("signup rejected: email already registered");
            Ok(SignupOutcome::AlreadyRegistered)
        }
    }
}

/// Check credentials and mint a session token.
///
/// Unknown email and wrong password produce the same outcome; the unknown-email
/// path still spends a bcrypt verification.
///
/// # Errors
/// Returns an error for store, hashing or signing failures.
pub async fn login(
    auth_state: &AuthState,
    store: &dyn UserStore,
    email: &str,
    password: &str,
) -> Result<LoginOutcome> {
    let email = normalize_email(email);
    let hasher = auth_state.hasher();

    let Some(record) = store.find_credential_by_email(&email).await? else {
        hasher.verify_dummy(password).await?;
        debug!("login rejected: unknown email");
        return Ok(LoginOutcome::InvalidCredentials);
    };

    if !hasher.verify(password, &record.password_hash).await? {
        debug!(user_id = %record.id, "login rejected: password mismatch");
        return Ok(LoginOutcome::InvalidCredentials);
    }

    let token = auth_state.tokens().issue(record.id, &record.email)?;
    info!(user_id = %record.id, "user logged in");
    Ok(LoginOutcome::Authenticated(token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use secrecy::SecretString;

    fn auth_state() -> AuthState {
        AuthState::new(
            AuthConfig::new("http://localhost:3000".to_string()).with_bcrypt_cost(4),
            &SecretString::from("j".repeat(32)),
            &SecretString::from("c".repeat(32)),
        )
    }

    #[tokio::test]
    async fn signup_twice_reports_already_registered() -> Result<()> {
        let state = auth_state();
        let store = MemoryStore::new();

        let first = signup(&state, &store, "alice@example.com", "password").await?;
        assert!(matches!(first, SignupOutcome::Created(_)));

        let second = signup(&state, &store, " ALICE@example.com ", "other-pass").await?;
        assert_eq!(second, SignupOutcome::AlreadyRegistered);
        Ok(())
    }

    #[tokio::test]
    async fn signup_never_stores_plaintext() -> Result<()> {
        let state = auth_state();
        let store = MemoryStore::new();
        signup(&state, &store, "bob@example.com", "hunter22").await?;

        let record = store
            .find_credential_by_email("bob@example.com")
            .await?
            .expect("record");
        assert_ne!(record.password_hash, "hunter22");
        assert!(state.hasher().verify("hunter22", &record.password_hash).await?);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_are_indistinguishable() -> Result<()> {
        let state = auth_state();
        let store = MemoryStore::new();
        signup(&state, &store, "carol@example.com", "right-pass").await?;

        let unknown = login(&state, &store, "nobody@example.com", "right-pass").await?;
        let wrong = login(&state, &store, "carol@example.com", "wrong-pass").await?;
        assert_eq!(unknown, LoginOutcome::InvalidCredentials);
        assert_eq!(wrong, LoginOutcome::InvalidCredentials);
        Ok(())
    }

    #[tokio::test]
    async fn login_issues_verifiable_token() -> Result<()> {
        let state = auth_state();
        let store = MemoryStore::new();
        let SignupOutcome::Created(id) =
            signup(&state, &store, "dave@example.com", "right-pass").await?
        else {
            anyhow::bail!("signup failed");
        };

        let LoginOutcome::Authenticated(token) =
            login(&state, &store, "Dave@Example.com", "right-pass").await?
        else {
            anyhow::bail!("login failed");
        };
        let claims = state.tokens().verify(&token)?;
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email, "dave@example.com");
        Ok(())
    }

    struct FailingStore;

    #[async_trait]
    impl UserStore for FailingStore {
        async fn find_credential_by_email(
            &self,
            _email: &str,
        ) -> Result<Option<crate::store::CredentialRecord>> {
            anyhow::bail!("database unavailable")
        }

        async fn create_credential(&self, _email: &str, _hash: &str) -> Result<CreateOutcome> {
            anyhow::bail!("database unavailable")
        }

        async fn find_identity_by_id(&self, _id: Uuid) -> Result<Option<crate::store::Identity>> {
            anyhow::bail!("database unavailable")
        }

        async fn update_nick_name(
            &self,
            _id: Uuid,
            _nick_name: Option<String>,
        ) -> Result<Option<crate::store::Identity>> {
            anyhow::bail!("database unavailable")
        }
    }

    #[tokio::test]
    async fn store_failures_propagate() {
        let state = auth_state();
        assert!(signup(&state, &FailingStore, "e@example.com", "password")
            .await
            .is_err());
        assert!(login(&state, &FailingStore, "e@example.com", "password")
            .await
            .is_err());
    }
}
