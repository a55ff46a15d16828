//! `POST /auth/signup`.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::{
    service::{self, SignupOutcome},
    state::AuthState,
    types::{AuthRequest, MessageResponse},
    utils::validate_auth_request,
};
use crate::api::handlers::error::{ApiError, ErrorResponse};
use crate::store::UserStore;

#[utoipa::path(
    post,
    path = "/auth/signup",
    request_body = AuthRequest,
    responses(
        (status = 201, description = "User registered", body = MessageResponse),
        (status = 400, description = "Invalid email or password", body = ErrorResponse),
        (status = 403, description = "Email already taken or CSRF check failed", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn signup(
    auth_state: Extension<Arc<AuthState>>,
    Extension(users): Extension<Arc<dyn UserStore>>,
    payload: Result<Json<AuthRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    validate_auth_request(&request)?;

    match service::signup(&auth_state, users.as_ref(), &request.email, &request.password).await? {
        SignupOutcome::Created(_) => Ok((StatusCode::CREATED, Json(MessageResponse::ok()))),
        SignupOutcome::AlreadyRegistered => Err(ApiError::Forbidden("This email is already taken")),
    }
}
