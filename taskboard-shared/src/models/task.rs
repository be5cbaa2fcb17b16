/// Task model and database operations
///
/// A task row is always owned by one assignee. Personal tasks have
/// `created_by == assigned_to`; instructor assignments are stored as one row
/// per student, tied together by a shared `assignment_id`.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
/// CREATE TYPE task_status AS ENUM ('pending', 'completed');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     assignment_id UUID,
///     created_by UUID NOT NULL REFERENCES users(id),
///     assigned_to UUID NOT NULL REFERENCES users(id),
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL,
///     due_date TIMESTAMPTZ NOT NULL,
///     priority task_priority NOT NULL DEFAULT 'low',
///     status task_status NOT NULL DEFAULT 'pending',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{NewTask, Priority, Task};
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::Utc;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let me = Uuid::new_v4();
///
/// let created = Task::insert_batch(&pool, vec![NewTask {
///     assignment_id: None,
///     created_by: me,
///     assigned_to: me,
///     title: "Read chapter 3".to_string(),
///     description: "Take notes on recursion".to_string(),
///     due_date: Utc::now(),
///     priority: Priority::Medium,
/// }]).await?;
///
/// let mine = Task::list_assigned_to(&pool, me).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::user::UserSummary;

/// Task priority
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!(
                "Invalid priority '{}': expected low, medium or high",
                other
            )),
        }
    }
}

/// Completion status of a single task instance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, TaskStatus::Completed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            other => Err(format!(
                "Invalid status '{}': expected pending or completed",
                other
            )),
        }
    }
}

/// Parses a due date given either as RFC 3339 or as a plain `YYYY-MM-DD`
///
/// Plain dates are interpreted as midnight UTC.
pub fn parse_due_date(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("Invalid due date '{}'", raw))
}

/// Persisted task record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Shared by every instance of one instructor fan-out (None for personal tasks)
    pub assignment_id: Option<Uuid>,

    /// User who initiated the task
    pub created_by: Uuid,

    /// User responsible for completing it
    pub assigned_to: Uuid,

    pub title: String,

    pub description: String,

    pub due_date: DateTime<Utc>,

    pub priority: Priority,

    pub status: TaskStatus,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// True when the creator is also the assignee
    pub fn is_personal(&self) -> bool {
        self.created_by == self.assigned_to
    }

    /// Attaches resolved creator/assignee summaries
    pub fn into_view(self, created_by: UserSummary, assigned_to: UserSummary) -> TaskView {
        TaskView {
            id: self.id,
            assignment_id: self.assignment_id,
            title: self.title,
            description: self.description,
            due_date: self.due_date,
            priority: self.priority,
            status: self.status,
            created_by,
            assigned_to,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Input for inserting a task (status always starts as pending)
#[derive(Debug, Clone)]
pub struct NewTask {
    pub assignment_id: Option<Uuid>,
    pub created_by: Uuid,
    pub assigned_to: Uuid,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
}

/// Task with `createdBy`/`assignedTo` resolved to `{id, name, role}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub assignment_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created_by: UserSummary,
    pub assigned_to: UserSummary,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Inserts every task in one transaction
    ///
    /// Either all rows are committed or none are: a failure on any insert
    /// rolls back the whole batch.
    pub async fn insert_batch(pool: &PgPool, tasks: Vec<NewTask>) -> Result<Vec<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut created = Vec::with_capacity(tasks.len());

        for task in tasks {
            created.push(Self::insert_with(&mut *tx, task).await?);
        }

        tx.commit().await?;

        Ok(created)
    }

    async fn insert_with<'e, E: PgExecutor<'e>>(executor: E, data: NewTask) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (id, assignment_id, created_by, assigned_to, title,
                               description, due_date, priority)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, assignment_id, created_by, assigned_to, title, description,
                      due_date, priority, status, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(data.assignment_id)
        .bind(data.created_by)
        .bind(data.assigned_to)
        .bind(data.title)
        .bind(data.description)
        .bind(data.due_date)
        .bind(data.priority)
        .fetch_one(executor)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, assignment_id, created_by, assigned_to, title, description,
                   due_date, priority, status, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks assigned to a user (personal and instructor-assigned)
    pub async fn list_assigned_to(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, assignment_id, created_by, assigned_to, title, description,
                   due_date, priority, status, created_at, updated_at
            FROM tasks
            WHERE assigned_to = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists tasks created by a user
    pub async fn list_created_by(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, assignment_id, created_by, assigned_to, title, description,
                   due_date, priority, status, created_at, updated_at
            FROM tasks
            WHERE created_by = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Lists every instance of one fan-out
    pub async fn list_by_assignment(
        pool: &PgPool,
        assignment_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, assignment_id, created_by, assigned_to, title, description,
                   due_date, priority, status, created_at, updated_at
            FROM tasks
            WHERE assignment_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(assignment_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Writes the mutable fields of a task back (last write wins)
    ///
    /// Returns None if the row no longer exists.
    pub async fn save(pool: &PgPool, task: &Task) -> Result<Option<Self>, sqlx::Error> {
        Self::save_with(pool, task).await
    }

    /// Saves several tasks in one transaction
    pub async fn save_batch(pool: &PgPool, tasks: &[Task]) -> Result<Vec<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut saved = Vec::with_capacity(tasks.len());

        for task in tasks {
            if let Some(row) = Self::save_with(&mut *tx, task).await? {
                saved.push(row);
            }
        }

        tx.commit().await?;

        Ok(saved)
    }

    async fn save_with<'e, E: PgExecutor<'e>>(executor: E, task: &Task) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2,
                description = $3,
                due_date = $4,
                priority = $5,
                status = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, assignment_id, created_by, assigned_to, title, description,
                      due_date, priority, status, created_at, updated_at
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.priority)
        .bind(task.status)
        .fetch_optional(executor)
        .await
    }

    /// Deletes a single task; true if a row was removed
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes the given tasks in one statement; returns the number of rows removed
    pub async fn delete_batch(pool: &PgPool, ids: &[Uuid]) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
