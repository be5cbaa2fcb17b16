/// Database models for Taskboard
///
/// This module contains the persisted entities and their SQL operations.
///
/// # Models
///
/// - `user`: Student and instructor accounts
/// - `task`: Personal tasks and per-student instances of instructor assignments
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::user::{Role, User};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let students = User::list_by_role(&pool, Role::Student).await?;
/// # Ok(())
/// # }
/// ```

pub mod task;
pub mod user;
