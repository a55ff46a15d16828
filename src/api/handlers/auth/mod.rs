//! Auth handlers and supporting modules.
//!
//! Sessions are stateless HS256 tokens carried in the `access_token` cookie.
//! Mutating requests are additionally guarded by a double-submit CSRF check
//! (see [`csrf`]); protected routes resolve the caller through
//! [`principal::require_auth`].
//!
//! > **Warning:** Changing the JWT secret invalidates every issued session, and
//! > changing the CSRF key invalidates every outstanding CSRF token.

pub(crate) mod csrf;
pub(crate) mod login;
pub mod password;
pub mod principal;
pub mod service;
pub(crate) mod session;
pub(crate) mod signup;
mod state;
pub mod token;
pub(crate) mod types;
mod utils;

pub use state::{AuthConfig, AuthState};
