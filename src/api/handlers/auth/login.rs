//! `POST /auth/login`.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{
    service::{self, LoginOutcome},
    session::session_cookie,
    state::AuthState,
    types::{AuthRequest, MessageResponse},
    utils::validate_auth_request,
};
use crate::api::handlers::error::{ApiError, ErrorResponse};
use crate::store::UserStore;

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = AuthRequest,
    responses(
        (status = 200, description = "Logged in; session cookie set", body = MessageResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "Invalid credentials or CSRF check failed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    auth_state: Extension<Arc<AuthState>>,
    Extension(users): Extension<Arc<dyn UserStore>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    validate_auth_request(&request)?;

    let token =
        match service::login(&auth_state, users.as_ref(), &request.email, &request.password)
            .await?
        {
            LoginOutcome::Authenticated(token) => token,
            LoginOutcome::InvalidCredentials => {
                return Err(ApiError::Forbidden("Email or password incorrect"))
            }
        };

    let cookie = session_cookie(auth_state.config(), &token)
        .map_err(|err| anyhow::anyhow!("failed to build session cookie: {err}"))?;
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((StatusCode::OK, headers, Json(MessageResponse::ok())))
}
