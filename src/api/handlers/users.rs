//! Profile endpoints for the logged-in user.

use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};
use serde::{Deserialize, Deserializer};
use std::sync::Arc;
use utoipa::ToSchema;

use super::{
    auth::principal::CurrentUser,
    error::{ApiError, ErrorResponse},
};
use crate::store::{Identity, UserStore};

/// Unknown fields are ignored. `nickName: null` clears the nickname; an absent
/// `nickName` leaves it untouched.
#[derive(ToSchema, Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<String>)]
    pub nick_name: Option<Option<String>>,
}

// Only runs when the key is present, so `null` becomes `Some(None)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[utoipa::path(
    get,
    path = "/user",
    responses(
        (status = 200, description = "The logged-in user", body = Identity),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    ),
    tag = "user"
)]
pub async fn get_user(CurrentUser(identity): CurrentUser) -> Json<Identity> {
    Json(identity)
}

#[utoipa::path(
    patch,
    path = "/user",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = Identity),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "CSRF check failed", body = ErrorResponse)
    ),
    tag = "user"
)]
pub async fn update_user(
    CurrentUser(identity): CurrentUser,
    Extension(users): Extension<Arc<dyn UserStore>>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> Result<Json<Identity>, ApiError> {
    let Json(request) = payload?;
    let Some(nick_name) = request.nick_name else {
        return Ok(Json(identity));
    };

    users
        .update_nick_name(identity.id, nick_name)
        .await?
        .map(Json)
        .ok_or(ApiError::Unauthorized)
}
