/// PostgreSQL storage backend
///
/// Thin adapter from the storage traits onto the sqlx operations defined on
/// the models. Unique violations on `users_email_key` surface as
/// [`StoreError::DuplicateEmail`].

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{Storage, StoreError, StoreResult, TaskRepository, UserDirectory};
use crate::db::pool::health_check;
use crate::models::task::{NewTask, Task};
use crate::models::user::{CreateUser, Role, User, UserSummary};

/// Storage backed by a PostgreSQL connection pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool (for migrations and shutdown)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_email_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err
            .constraint()
            .map(|constraint| constraint.contains("email"))
            .unwrap_or(false),
        _ => false,
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let email = data.email.clone();

        User::create(&self.pool, data).await.map_err(|err| {
            if is_email_conflict(&err) {
                StoreError::DuplicateEmail(email)
            } else {
                StoreError::Database(err)
            }
        })
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn find_users_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        Ok(User::list_by_role(&self.pool, role).await?)
    }

    async fn find_user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        Ok(User::find_summaries(&self.pool, ids).await?)
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> StoreResult<Vec<Task>> {
        Ok(Task::insert_batch(&self.pool, tasks).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn find_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_assigned_to(&self.pool, user_id).await?)
    }

    async fn find_tasks_created_by(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_created_by(&self.pool, user_id).await?)
    }

    async fn find_assignment_tasks(&self, assignment_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_assignment(&self.pool, assignment_id).await?)
    }

    async fn save_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        Ok(Task::save(&self.pool, task).await?)
    }

    async fn save_tasks(&self, tasks: &[Task]) -> StoreResult<Vec<Task>> {
        Ok(Task::save_batch(&self.pool, tasks).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }

    async fn delete_tasks(&self, ids: &[Uuid]) -> StoreResult<u64> {
        Ok(Task::delete_batch(&self.pool, ids).await?)
    }
}

#[async_trait]
impl Storage for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }
}
