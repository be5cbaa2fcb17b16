/// Storage abstraction for users and tasks
///
/// The task engine only talks to storage through these traits, so the same
/// authorization and fan-out logic runs against PostgreSQL in production and
/// against [`MemoryStore`] in tests.
///
/// # Traits
///
/// - [`UserDirectory`]: account lookup, registration and populate support
/// - [`TaskRepository`]: task CRUD, including atomic batch writes
/// - [`Storage`]: both of the above plus a connectivity probe
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_shared::store::{PgStore, Storage};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let store: Arc<dyn Storage> = Arc::new(PgStore::new(pool));
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::task::{NewTask, Task};
use crate::models::user::{CreateUser, Role, User, UserSummary};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Email is already registered to another account
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    /// A task references a user that does not exist
    #[error("Referenced user {0} does not exist")]
    MissingUser(Uuid),

    /// Storage backend refused the operation
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Read/write access to user accounts
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Registers a new account; fails with `DuplicateEmail` if taken
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// All users with a role, oldest account first
    async fn find_users_by_role(&self, role: Role) -> StoreResult<Vec<User>>;

    /// Resolves IDs to `{id, name, role}`; unknown IDs are omitted
    async fn find_user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>>;
}

/// Read/write access to task records
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts all tasks or none of them
    async fn insert_tasks(&self, tasks: Vec<NewTask>) -> StoreResult<Vec<Task>>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks whose assignee is `user_id`, in creation order
    async fn find_tasks_assigned_to(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Tasks whose creator is `user_id`, in creation order
    async fn find_tasks_created_by(&self, user_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Every instance of one fan-out, in creation order
    async fn find_assignment_tasks(&self, assignment_id: Uuid) -> StoreResult<Vec<Task>>;

    /// Persists the mutable fields of a task; None if it no longer exists
    async fn save_task(&self, task: &Task) -> StoreResult<Option<Task>>;

    /// Persists several tasks atomically
    async fn save_tasks(&self, tasks: &[Task]) -> StoreResult<Vec<Task>>;

    /// Deletes one task; true if it existed
    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;

    /// Deletes several tasks atomically; returns how many were removed
    async fn delete_tasks(&self, ids: &[Uuid]) -> StoreResult<u64>;
}

/// Complete storage backend used by the API
#[async_trait]
pub trait Storage: UserDirectory + TaskRepository {
    /// Verifies the backend is reachable
    async fn ping(&self) -> StoreResult<()>;
}
