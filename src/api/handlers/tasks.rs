//! Task CRUD for the logged-in user. Every store call is scoped by the caller's id.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Extension, Path,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;
use utoipa::ToSchema;

use super::{
    auth::principal::CurrentUser,
    error::{ApiError, ErrorResponse},
};
use crate::store::{NewTask, Task, TaskPatch, TaskStore};

#[derive(ToSchema, Deserialize, Debug)]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
}

#[derive(ToSchema, Deserialize, Debug, Default)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

fn require_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("title should not be empty".to_string()));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/todo",
    responses(
        (status = 200, description = "Tasks of the logged-in user, newest first", body = [Task]),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse)
    ),
    tag = "todo"
)]
pub async fn list_tasks(
    CurrentUser(identity): CurrentUser,
    Extension(tasks): Extension<Arc<dyn TaskStore>>,
) -> Result<Json<Vec<Task>>, ApiError> {
    Ok(Json(tasks.list_tasks(identity.id).await?))
}

#[utoipa::path(
    get,
    path = "/todo/{id}",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 200, description = "The task", body = Task),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 404, description = "No such task for this user", body = ErrorResponse)
    ),
    tag = "todo"
)]
pub async fn get_task(
    CurrentUser(identity): CurrentUser,
    Extension(tasks): Extension<Arc<dyn TaskStore>>,
    task_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(task_id) = task_id?;
    tasks
        .find_task(identity.id, task_id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("Task not found"))
}

#[utoipa::path(
    post,
    path = "/todo",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Missing title", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "CSRF check failed", body = ErrorResponse)
    ),
    tag = "todo"
)]
pub async fn create_task(
    CurrentUser(identity): CurrentUser,
    Extension(tasks): Extension<Arc<dyn TaskStore>>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(request) = payload?;
    require_title(&request.title)?;

    let task = tasks
        .create_task(
            identity.id,
            NewTask {
                title: request.title,
                description: request.description,
            },
        )
        .await?;
    debug!(task_id = task.id, user_id = %identity.id, "task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[utoipa::path(
    patch,
    path = "/todo/{id}",
    params(("id" = i64, Path, description = "Task id")),
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Malformed body or id", body = ErrorResponse),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Not the owner, or CSRF check failed", body = ErrorResponse)
    ),
    tag = "todo"
)]
pub async fn update_task(
    CurrentUser(identity): CurrentUser,
    Extension(tasks): Extension<Arc<dyn TaskStore>>,
    task_id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Task>, ApiError> {
    let Path(task_id) = task_id?;
    let Json(request) = payload?;
    if let Some(title) = &request.title {
        require_title(title)?;
    }

    let patch = TaskPatch {
        title: request.title,
        description: request.description,
    };
    tasks
        .update_task(identity.id, task_id, patch)
        .await?
        .map(Json)
        .ok_or(ApiError::Forbidden("No permission to update"))
}

#[utoipa::path(
    delete,
    path = "/todo/{id}",
    params(("id" = i64, Path, description = "Task id")),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 401, description = "Missing or invalid session", body = ErrorResponse),
        (status = 403, description = "Not the owner, or CSRF check failed", body = ErrorResponse)
    ),
    tag = "todo"
)]
pub async fn delete_task(
    CurrentUser(identity): CurrentUser,
    Extension(tasks): Extension<Arc<dyn TaskStore>>,
    task_id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let Path(task_id) = task_id?;
    if tasks.delete_task(identity.id, task_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::Forbidden("No permission to delete"))
    }
}
