//! # Taskgate (session authentication for the task tracker)
//!
//! `taskgate` fronts a multi-tenant task-tracking API. It authenticates users by
//! email and password, issues a signed session token carried in an `HttpOnly`
//! cookie, and protects every state-changing request with a double-submit CSRF
//! check.
//!
//! ## Sessions
//!
//! Session tokens are HS256 JWTs (`sub`, `email`, `iat`, `exp`) valid for 120
//! minutes. Nothing is stored server-side: a token is valid while its signature
//! and expiry check out. Logout overwrites the `access_token` cookie.
//!
//! ## CSRF
//!
//! `GET /auth/csrf` seeds an `HttpOnly` `_csrf` secret cookie and returns a token
//! derived from it. Mutating requests must echo that token in the `csrf-token`
//! header; anything else is rejected with `403` before a handler runs.
//!
//! ## Request identity
//!
//! Protected routes run behind [`api::handlers::auth::principal::require_auth`],
//! which verifies the session token, resolves the user through the store and
//! hands handlers a [`store::Identity`] that never includes the password hash.

pub mod api;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};
