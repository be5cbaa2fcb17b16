/// In-memory storage backend
///
/// Implements the same contract as [`PgStore`](super::PgStore): unique
/// emails, foreign-key checks on task insert, creation-ordered listings and
/// all-or-nothing batch writes. Used by the test suites and handy for running
/// the API without a database.
///
/// Failure injection (`fail_after`, `fail_all`) lets tests prove that a batch
/// interrupted part-way leaves nothing behind.
///
/// # Example
///
/// ```
/// use taskboard_shared::models::user::{CreateUser, Role};
/// use taskboard_shared::store::{MemoryStore, UserDirectory};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// store.create_user(CreateUser {
///     name: "Grace".to_string(),
///     email: "grace@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::Student,
/// }).await?;
///
/// assert_eq!(store.find_users_by_role(Role::Student).await?.len(), 1);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Storage, StoreError, StoreResult, TaskRepository, UserDirectory};
use crate::models::task::{NewTask, Task, TaskStatus};
use crate::models::user::{normalize_email, CreateUser, Role, User, UserSummary};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    tasks: Vec<Task>,
    /// Task writes allowed before the next one fails (None = never fail)
    fail_after: Option<usize>,
}

impl Inner {
    fn user_exists(&self, id: Uuid) -> bool {
        self.users.iter().any(|u| u.id == id)
    }

    /// Consumes one unit of the write budget, failing once it is exhausted
    fn charge_write(&mut self) -> StoreResult<()> {
        match self.fail_after {
            Some(0) => Err(StoreError::Unavailable(
                "injected write failure".to_string(),
            )),
            Some(ref mut remaining) => {
                *remaining -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Storage kept in process memory behind a `tokio` RwLock
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lets the next `writes` task writes succeed, then fails every one after
    ///
    /// `None` turns failure injection off.
    pub async fn fail_after(&self, writes: Option<usize>) {
        self.inner.write().await.fail_after = writes;
    }

    /// Fails every task write until reset with `fail_after(None)`
    pub async fn fail_all(&self) {
        self.fail_after(Some(0)).await;
    }

    /// Snapshot of every stored task, in creation order
    pub async fn all_tasks(&self) -> Vec<Task> {
        self.inner.read().await.tasks.clone()
    }

    pub async fn task_count(&self) -> usize {
        self.inner.read().await.tasks.len()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut inner = self.inner.write().await;
        let email = normalize_email(&data.email);

        if inner.users.iter().any(|u| u.email == email) {
            return Err(StoreError::DuplicateEmail(email));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: data.name.trim().to_string(),
            email,
            password_hash: data.password_hash,
            role: data.role,
            created_at: now,
            updated_at: now,
        };

        inner.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        let email = normalize_email(email);
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_users_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.iter().filter(|u| u.role == role).cloned().collect())
    }

    async fn find_user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(UserSummary::from)
            .collect())
    }
}

#[async_trait]
impl TaskRepository for MemoryStore {
    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> StoreResult<Vec<Task>> {
        let mut inner = self.inner.write().await;
        let mut staged = Vec::with_capacity(tasks.len());

        for new_task in tasks {
            inner.charge_write()?;

            for user_id in [new_task.created_by, new_task.assigned_to] {
                if !inner.user_exists(user_id) {
                    return Err(StoreError::MissingUser(user_id));
                }
            }

            let now = Utc::now();
            staged.push(Task {
                id: Uuid::new_v4(),
                assignment_id: new_task.assignment_id,
                created_by: new_task.created_by,
                assigned_to: new_task.assigned_to,
                title: new_task.title,
                description: new_task.description,
                due_date: new_task.due_date,
                priority: new_task.priority,
                status: TaskStatus::Pending,
                created_at: now,
                updated_at: now,
            });
        }

        inner.tasks.extend(staged.iter().cloned());
        Ok(staged)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let inner = self.inner.read().await;
        Ok(inner.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.assigned_to == user_id)
            .cloned()
            .collect())
    }

    async fn find_tasks_created_by(&self, user_id: Uuid) -> StoreResult<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.created_by == user_id)
            .cloned()
            .collect())
    }

    async fn find_assignment_tasks(&self, assignment_id: Uuid) -> StoreResult<Vec<Task>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tasks
            .iter()
            .filter(|t| t.assignment_id == Some(assignment_id))
            .cloned()
            .collect())
    }

    async fn save_task(&self, task: &Task) -> StoreResult<Option<Task>> {
        let mut saved = self.save_tasks(std::slice::from_ref(task)).await?;
        Ok(saved.pop())
    }

    async fn save_tasks(&self, tasks: &[Task]) -> StoreResult<Vec<Task>> {
        let mut inner = self.inner.write().await;
        let mut updated = inner.tasks.clone();
        let mut saved = Vec::with_capacity(tasks.len());

        for task in tasks {
            inner.charge_write()?;

            if let Some(row) = updated.iter_mut().find(|t| t.id == task.id) {
                row.title = task.title.clone();
                row.description = task.description.clone();
                row.due_date = task.due_date;
                row.priority = task.priority;
                row.status = task.status;
                row.updated_at = Utc::now();
                saved.push(row.clone());
            }
        }

        inner.tasks = updated;
        Ok(saved)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        inner.charge_write()?;

        let before = inner.tasks.len();
        inner.tasks.retain(|t| t.id != id);
        Ok(inner.tasks.len() < before)
    }

    async fn delete_tasks(&self, ids: &[Uuid]) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        inner.charge_write()?;

        let before = inner.tasks.len();
        inner.tasks.retain(|t| !ids.contains(&t.id));
        Ok((before - inner.tasks.len()) as u64)
    }
}

#[async_trait]
impl Storage for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
