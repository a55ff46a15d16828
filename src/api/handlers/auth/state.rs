//! Auth configuration and the process-wide state built from it.

use secrecy::{ExposeSecret, SecretString};

use super::{
    csrf::CsrfGuard,
    password::{CredentialHasher, DEFAULT_BCRYPT_COST},
    token::{TokenIssuer, DEFAULT_TOKEN_TTL_SECONDS},
};

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    session_cookie_secure: bool,
    token_ttl_seconds: i64,
    bcrypt_cost: u32,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            session_cookie_secure: true,
            token_ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
            bcrypt_cost: DEFAULT_BCRYPT_COST,
        }
    }

    /// Drop the `Secure` cookie attribute. Only for plain-HTTP development setups.
    #[must_use]
    pub fn with_session_cookie_secure(mut self, secure: bool) -> Self {
        self.session_cookie_secure = secure;
        self
    }

    #[must_use]
    pub fn with_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn session_cookie_secure(&self) -> bool {
        self.session_cookie_secure
    }

    #[must_use]
    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl_seconds
    }
}

/// Immutable after startup; shared as `Arc<AuthState>`.
pub struct AuthState {
    config: AuthConfig,
    tokens: TokenIssuer,
    csrf: CsrfGuard,
    hasher: CredentialHasher,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, jwt_secret: &SecretString, csrf_key: &SecretString) -> Self {
        let tokens = TokenIssuer::new(
            jwt_secret.expose_secret().as_bytes(),
            config.token_ttl_seconds,
        );
        let csrf = CsrfGuard::new(csrf_key.expose_secret().as_bytes());
        let hasher = CredentialHasher::new(config.bcrypt_cost);
        Self {
            config,
            tokens,
            csrf,
            hasher,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    #[must_use]
    pub fn csrf(&self) -> &CsrfGuard {
        &self.csrf
    }

    #[must_use]
    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }
}
