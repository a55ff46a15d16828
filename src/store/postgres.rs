//! Postgres-backed store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, postgres::PgRow, PgPool, Row};
use std::time::Duration;
use tracing::Instrument;
use uuid::Uuid;

use super::{
    CreateOutcome, CredentialRecord, Identity, NewTask, Task, TaskPatch, TaskStore, UserStore,
};

const SCHEMA_SQL: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/sql/schema.sql"));

const IDENTITY_COLUMNS: &str = r#"
    id,
    email,
    nick_name,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at
"#;

const TASK_COLUMNS: &str = r#"
    id,
    title,
    description,
    to_char(created_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at,
    to_char(updated_at AT TIME ZONE 'utc', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS updated_at,
    user_id
"#;

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to Postgres with the service pool settings.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    ///
    /// # Errors
    /// Returns an error if any schema statement fails.
    pub async fn apply_schema(&self) -> Result<()> {
        sqlx::raw_sql(SCHEMA_SQL)
            .execute(&self.pool)
            .await
            .context("failed to apply schema")?;
        Ok(())
    }
}

fn db_span(operation: &'static str, statement: &str) -> tracing::Span {
    tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn identity_from_row(row: &PgRow) -> Identity {
    Identity {
        id: row.get("id"),
        email: row.get("email"),
        nick_name: row.get("nick_name"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn task_from_row(row: &PgRow) -> Task {
    Task {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        user_id: row.get("user_id"),
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_credential_by_email(&self, email: &str) -> Result<Option<CredentialRecord>> {
        let query = "SELECT id, email, hashed_password FROM users WHERE email = $1";
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", query))
            .await
            .context("failed to lookup credential record")?;

        Ok(row.map(|row| CredentialRecord {
            id: row.get("id"),
            email: row.get("email"),
            password_hash: row.get("hashed_password"),
        }))
    }

    async fn create_credential(&self, email: &str, password_hash: &str) -> Result<CreateOutcome> {
        let query = r"
            INSERT INTO users (id, email, hashed_password)
            VALUES ($1, $2, $3)
        ";
        let id = Uuid::new_v4();
        let result = sqlx::query(query)
            .bind(id)
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .instrument(db_span("INSERT", query))
            .await;

        match result {
            Ok(_) => Ok(CreateOutcome::Created(id)),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::UniqueViolation),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let query = format!("SELECT {IDENTITY_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .context("failed to lookup identity")?;

        Ok(row.as_ref().map(identity_from_row))
    }

    async fn update_nick_name(
        &self,
        id: Uuid,
        nick_name: Option<String>,
    ) -> Result<Option<Identity>> {
        let query = format!(
            "UPDATE users SET nick_name = $2, updated_at = NOW() WHERE id = $1 RETURNING {IDENTITY_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(id)
            .bind(nick_name)
            .fetch_optional(&self.pool)
            .instrument(db_span("UPDATE", &query))
            .await
            .context("failed to update nick name")?;

        Ok(row.as_ref().map(identity_from_row))
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY tasks.created_at DESC, tasks.id DESC"
        );
        let rows = sqlx::query(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .context("failed to list tasks")?;

        Ok(rows.iter().map(task_from_row).collect())
    }

    async fn find_task(&self, user_id: Uuid, task_id: i64) -> Result<Option<Task>> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");
        let row = sqlx::query(&query)
            .bind(task_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(db_span("SELECT", &query))
            .await
            .context("failed to lookup task")?;

        Ok(row.as_ref().map(task_from_row))
    }

    async fn create_task(&self, user_id: Uuid, task: NewTask) -> Result<Task> {
        let query = format!(
            "INSERT INTO tasks (title, description, user_id) VALUES ($1, $2, $3) RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(task.title)
            .bind(task.description)
            .bind(user_id)
            .fetch_one(&self.pool)
            .instrument(db_span("INSERT", &query))
            .await
            .context("failed to insert task")?;

        Ok(task_from_row(&row))
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: i64,
        patch: TaskPatch,
    ) -> Result<Option<Task>> {
        let query = format!(
            r"
            UPDATE tasks
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TASK_COLUMNS}
            "
        );
        let row = sqlx::query(&query)
            .bind(task_id)
            .bind(user_id)
            .bind(patch.title)
            .bind(patch.description)
            .fetch_optional(&self.pool)
            .instrument(db_span("UPDATE", &query))
            .await
            .context("failed to update task")?;

        Ok(row.as_ref().map(task_from_row))
    }

    async fn delete_task(&self, user_id: Uuid, task_id: i64) -> Result<bool> {
        let query = "DELETE FROM tasks WHERE id = $1 AND user_id = $2";
        let result = sqlx::query(query)
            .bind(task_id)
            .bind(user_id)
            .execute(&self.pool)
            .instrument(db_span("DELETE", query))
            .await
            .context("failed to delete task")?;

        Ok(result.rows_affected() > 0)
    }
}
