//! Request identity guard and the extractor handlers use to read it.
//!
//! Flow Overview: read the session token (cookie, then bearer header), verify
//! it, resolve the subject through the user store and stash the hash-free
//! [`Identity`] in request extensions. Handlers behind the guard take a
//! [`CurrentUser`] argument instead of touching tokens themselves.

use axum::{
    async_trait,
    extract::{Extension, FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{session::extract_session_token, state::AuthState};
use crate::api::handlers::error::ApiError;
use crate::store::{Identity, UserStore};

/// The authenticated user for the current request.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub Identity);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// Resolve the request's session token into an identity, or 401.
///
/// # Errors
/// [`ApiError::Unauthorized`] for a missing, invalid or orphaned token;
/// [`ApiError::Internal`] if the store lookup fails.
pub async fn authenticate(
    auth_state: &AuthState,
    users: &dyn UserStore,
    headers: &axum::http::HeaderMap,
) -> Result<Identity, ApiError> {
    let token = extract_session_token(headers).ok_or(ApiError::Unauthorized)?;
    let claims = auth_state
        .tokens()
        .verify(&token)
        .map_err(|_| ApiError::Unauthorized)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| ApiError::Unauthorized)?;

    match users.find_identity_by_id(user_id).await? {
        Some(identity) => Ok(identity),
        None => {
            debug!(user_id = %user_id, "session token for unknown user");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Middleware for protected routers (`route_layer`).
pub async fn require_auth(
    auth_state: Extension<Arc<AuthState>>,
    Extension(users): Extension<Arc<dyn UserStore>>,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = authenticate(&auth_state, users.as_ref(), request.headers()).await;
    match resolved {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(err) => err.into_response(),
    }
}
