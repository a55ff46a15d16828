//! Persistence contracts consumed by the auth core and the task handlers.
//!
//! Handlers never talk to a database directly; they receive `Arc<dyn UserStore>`
//! and `Arc<dyn TaskStore>` through request extensions. [`PgStore`] is the
//! production backend, [`MemoryStore`] backs tests and database-less local runs.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Stored credentials for a single user, only ever read by the auth gateway.
#[derive(Clone, Debug)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

/// Outcome of inserting a new credential record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created(Uuid),
    UniqueViolation,
}

/// The user as seen by request handlers. Deliberately has no password hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
    pub nick_name: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub user_id: Uuid,
}

#[derive(Clone, Debug, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
}

/// Partial task update; `None` leaves the field untouched.
#[derive(Clone, Debug, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_credential_by_email(&self, email: &str) -> Result<Option<CredentialRecord>>;

    /// Insert a credential. Email collisions are reported as
    /// [`CreateOutcome::UniqueViolation`], never as an error.
    async fn create_credential(&self, email: &str, password_hash: &str) -> Result<CreateOutcome>;

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>>;

    async fn update_nick_name(&self, id: Uuid, nick_name: Option<String>)
        -> Result<Option<Identity>>;
}

/// Task persistence. Every call is scoped by the owning user id.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks owned by `user_id`, newest first.
    async fn list_tasks(&self, user_id: Uuid) -> Result<Vec<Task>>;

    async fn find_task(&self, user_id: Uuid, task_id: i64) -> Result<Option<Task>>;

    async fn create_task(&self, user_id: Uuid, task: NewTask) -> Result<Task>;

    /// Returns `None` when the task is missing or owned by someone else.
    async fn update_task(&self, user_id: Uuid, task_id: i64, patch: TaskPatch)
        -> Result<Option<Task>>;

    /// Returns `false` when the task is missing or owned by someone else.
    async fn delete_task(&self, user_id: Uuid, task_id: i64) -> Result<bool>;
}
