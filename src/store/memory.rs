//! In-process store used by tests and by `--dsn memory://` local runs.
//! Data is lost when the process exits.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CreateOutcome, CredentialRecord, Identity, NewTask, Task, TaskPatch, TaskStore, UserStore,
};

#[derive(Clone, Debug)]
struct UserRow {
    credential: CredentialRecord,
    nick_name: Option<String>,
    created_at: String,
    updated_at: String,
}

impl UserRow {
    fn identity(&self) -> Identity {
        Identity {
            id: self.credential.id,
            email: self.credential.email.clone(),
            nick_name: self.nick_name.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, UserRow>,
    emails: HashMap<String, Uuid>,
    tasks: HashMap<i64, Task>,
    next_task_id: i64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_credential_by_email(&self, email: &str) -> Result<Option<CredentialRecord>> {
        let inner = self.inner.read().await;
        Ok(inner
            .emails
            .get(email)
            .and_then(|id| inner.users.get(id))
            .map(|row| row.credential.clone()))
    }

    async fn create_credential(&self, email: &str, password_hash: &str) -> Result<CreateOutcome> {
        let mut inner = self.inner.write().await;
        if inner.emails.contains_key(email) {
            return Ok(CreateOutcome::UniqueViolation);
        }

        let id = Uuid::new_v4();
        let timestamp = now();
        inner.emails.insert(email.to_string(), id);
        inner.users.insert(
            id,
            UserRow {
                credential: CredentialRecord {
                    id,
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                },
                nick_name: None,
                created_at: timestamp.clone(),
                updated_at: timestamp,
            },
        );
        Ok(CreateOutcome::Created(id))
    }

    async fn find_identity_by_id(&self, id: Uuid) -> Result<Option<Identity>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).map(UserRow::identity))
    }

    async fn update_nick_name(
        &self,
        id: Uuid,
        nick_name: Option<String>,
    ) -> Result<Option<Identity>> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(&id).map(|row| {
            row.nick_name = nick_name;
            row.updated_at = now();
            row.identity()
        }))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self, user_id: Uuid) -> Result<Vec<Task>> {
        let inner = self.inner.read().await;
        let mut tasks: Vec<Task> = inner
            .tasks
            .values()
            .filter(|task| task.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(tasks)
    }

    async fn find_task(&self, user_id: Uuid, task_id: i64) -> Result<Option<Task>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .get(&task_id)
            .filter(|task| task.user_id == user_id)
            .cloned())
    }

    async fn create_task(&self, user_id: Uuid, task: NewTask) -> Result<Task> {
        let mut inner = self.inner.write().await;
        inner.next_task_id += 1;
        let timestamp = now();
        let task = Task {
            id: inner.next_task_id,
            title: task.title,
            description: task.description,
            created_at: timestamp.clone(),
            updated_at: timestamp,
            user_id,
        };
        inner.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn update_task(
        &self,
        user_id: Uuid,
        task_id: i64,
        patch: TaskPatch,
    ) -> Result<Option<Task>> {
        let mut inner = self.inner.write().await;
        let Some(task) = inner
            .tasks
            .get_mut(&task_id)
            .filter(|task| task.user_id == user_id)
        else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        task.updated_at = now();
        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, user_id: Uuid, task_id: i64) -> Result<bool> {
        let mut inner = self.inner.write().await;
        let owned = inner
            .tasks
            .get(&task_id)
            .is_some_and(|task| task.user_id == user_id);
        if owned {
            inner.tasks.remove(&task_id);
        }
        Ok(owned)
    }
}
