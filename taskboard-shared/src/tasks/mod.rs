/// Task fan-out and authorization engine
///
/// Every task operation the API exposes goes through [`TaskEngine`]. The
/// engine receives an already-authenticated [`Actor`] and decides what that
/// actor may see or change; it never looks at credentials itself.
///
/// # Modules
///
/// - [`patch`]: parsing and validation of partial updates
/// - [`policy`]: per-role update/delete rules
/// - [`grouping`]: logical assignments, progress and dashboard counters
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskboard_shared::models::user::{CreateUser, Role};
/// use taskboard_shared::store::{MemoryStore, UserDirectory};
/// use taskboard_shared::tasks::{Actor, CreateTaskRequest, TaskEngine};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = Arc::new(MemoryStore::new());
/// let student = store.create_user(CreateUser {
///     name: "Ada".to_string(),
///     email: "ada@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: Role::Student,
/// }).await?;
///
/// let engine = TaskEngine::new(store);
/// let created = engine.create_task(&Actor::from(&student), CreateTaskRequest {
///     title: Some("Read chapter 3".to_string()),
///     description: Some("Take notes".to_string()),
///     due_date: Some("2025-05-01".to_string()),
///     priority: Some("medium".to_string()),
/// }).await?;
///
/// assert_eq!(created.len(), 1);
/// # Ok(())
/// # }
/// ```

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::task::{parse_due_date, NewTask, Priority, Task, TaskStatus, TaskView};
use crate::models::user::{Role, User, UserProfile, UserSummary};
use crate::store::{Storage, StoreError};

pub mod grouping;
pub mod patch;
pub mod policy;

pub use grouping::{Assignment, TaskSummary};
pub use patch::TaskPatch;

/// Error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// Input is missing or malformed
    #[error("{0}")]
    Validation(String),

    /// Actor is authenticated but not allowed to do this
    #[error("{0}")]
    Forbidden(String),

    /// Target task, assignment or dependent resource does not exist
    #[error("{0}")]
    NotFound(String),

    /// Storage layer failure
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Engine result type alias
pub type TaskResult<T> = Result<T, TaskError>;

/// Authenticated identity performing an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
        }
    }
}

/// Body of a create request
///
/// Fields are optional so that a missing field produces the engine's own
/// validation message instead of a deserialization error.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(max = 200, message = "Title must be at most 200 characters."))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub due_date: Option<String>,

    pub priority: Option<String>,
}

/// Optional narrowing applied to a task listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<Priority>,

    /// Case-insensitive match against title or assignee name
    pub search: Option<String>,
}

impl TaskFilter {
    fn matches(&self, view: &TaskView) -> bool {
        if self.status.is_some_and(|s| s != view.status) {
            return false;
        }

        if self.priority.is_some_and(|p| p != view.priority) {
            return false;
        }

        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                let needle = needle.to_lowercase();
                view.title.to_lowercase().contains(&needle)
                    || view.assigned_to.name.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

struct ValidatedTask {
    title: String,
    description: String,
    due_date: chrono::DateTime<chrono::Utc>,
    priority: Priority,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl CreateTaskRequest {
    fn into_validated(self) -> TaskResult<ValidatedTask> {
        let missing = || TaskError::Validation("Please fill all required fields.".to_string());

        self.validate()
            .map_err(|e| TaskError::Validation(e.to_string()))?;

        let title = present(self.title).ok_or_else(missing)?;
        let description = present(self.description).ok_or_else(missing)?;
        let due_date = present(self.due_date).ok_or_else(missing)?;
        let priority = present(self.priority).ok_or_else(missing)?;

        Ok(ValidatedTask {
            title,
            description,
            due_date: parse_due_date(&due_date).map_err(TaskError::Validation)?,
            priority: priority.parse().map_err(TaskError::Validation)?,
        })
    }
}

/// Storage-agnostic task engine
#[derive(Clone)]
pub struct TaskEngine {
    store: Arc<dyn Storage>,
}

impl std::fmt::Debug for TaskEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskEngine").finish_non_exhaustive()
    }
}

impl TaskEngine {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self { store }
    }

    /// Creates a personal task (student) or fans one out to every student
    /// (instructor)
    ///
    /// # Errors
    ///
    /// - `Validation` if a field is missing, the priority is unknown or the
    ///   due date does not parse
    /// - `NotFound` if an instructor creates a task while no students exist
    pub async fn create_task(
        &self,
        actor: &Actor,
        request: CreateTaskRequest,
    ) -> TaskResult<Vec<TaskView>> {
        let task = request.into_validated()?;

        let created = match actor.role {
            Role::Instructor => self.fan_out(actor, task).await?,
            Role::Student => self.create_personal(actor, task).await?,
        };

        self.populate(created).await
    }

    async fn fan_out(&self, actor: &Actor, task: ValidatedTask) -> TaskResult<Vec<Task>> {
        let students = self.store.find_users_by_role(Role::Student).await?;

        if students.is_empty() {
            return Err(TaskError::NotFound(
                "No students found to assign tasks to.".to_string(),
            ));
        }

        let assignment_id = Uuid::new_v4();
        let batch = students
            .iter()
            .map(|student| NewTask {
                assignment_id: Some(assignment_id),
                created_by: actor.user_id,
                assigned_to: student.id,
                title: task.title.clone(),
                description: task.description.clone(),
                due_date: task.due_date,
                priority: task.priority,
            })
            .collect();

        let created = self.store.insert_tasks(batch).await?;

        info!(
            instructor_id = %actor.user_id,
            assignment_id = %assignment_id,
            count = created.len(),
            "Assignment fanned out to students"
        );

        Ok(created)
    }

    async fn create_personal(&self, actor: &Actor, task: ValidatedTask) -> TaskResult<Vec<Task>> {
        let created = self
            .store
            .insert_tasks(vec![NewTask {
                assignment_id: None,
                created_by: actor.user_id,
                assigned_to: actor.user_id,
                title: task.title,
                description: task.description,
                due_date: task.due_date,
                priority: task.priority,
            }])
            .await?;

        debug!(student_id = %actor.user_id, "Personal task created");
        Ok(created)
    }

    /// Lists the tasks visible to `actor`
    ///
    /// Students see every task assigned to them; instructors see every task
    /// they created.
    pub async fn read_tasks(&self, actor: &Actor, filter: &TaskFilter) -> TaskResult<Vec<TaskView>> {
        let tasks = self.visible_tasks(actor).await?;
        let mut views = self.populate(tasks).await?;

        views.retain(|view| filter.matches(view));
        Ok(views)
    }

    async fn visible_tasks(&self, actor: &Actor) -> TaskResult<Vec<Task>> {
        let tasks = match actor.role {
            Role::Student => self.store.find_tasks_assigned_to(actor.user_id).await?,
            Role::Instructor => self.store.find_tasks_created_by(actor.user_id).await?,
        };

        Ok(tasks)
    }

    /// Applies an already-validated patch after the per-role checks
    pub async fn update_task(
        &self,
        actor: &Actor,
        task_id: Uuid,
        patch: &TaskPatch,
    ) -> TaskResult<TaskView> {
        let mut task = self.find_task(task_id).await?;

        policy::authorize_update(actor, &task, patch)?;

        if patch.is_empty() {
            return self.populate_one(task).await;
        }

        patch.apply_to(&mut task);

        let saved = self
            .store
            .save_task(&task)
            .await?
            .ok_or_else(task_not_found)?;

        debug!(task_id = %task_id, user_id = %actor.user_id, "Task updated");
        self.populate_one(saved).await
    }

    /// Deletes one task; sibling instances of a fan-out are untouched
    pub async fn delete_task(&self, actor: &Actor, task_id: Uuid) -> TaskResult<()> {
        let task = self.find_task(task_id).await?;

        policy::authorize_delete(actor, &task)?;

        if !self.store.delete_task(task_id).await? {
            return Err(task_not_found());
        }

        debug!(task_id = %task_id, user_id = %actor.user_id, "Task deleted");
        Ok(())
    }

    /// Lists every student (instructors only)
    pub async fn list_students(&self, actor: &Actor) -> TaskResult<Vec<UserProfile>> {
        match actor.role {
            Role::Instructor => {
                let students = self.store.find_users_by_role(Role::Student).await?;
                Ok(students.iter().map(UserProfile::from).collect())
            }
            Role::Student => Err(TaskError::Forbidden(
                "Only instructors can view students.".to_string(),
            )),
        }
    }

    /// Groups the instructor's tasks into logical assignments
    pub async fn list_assignments(&self, actor: &Actor) -> TaskResult<Vec<Assignment>> {
        require_instructor(actor)?;

        let views = self.read_tasks(actor, &TaskFilter::default()).await?;
        Ok(grouping::group_assignments(&views))
    }

    /// Applies shared fields to every instance of an assignment atomically
    ///
    /// `key` is the [`Assignment::key`] reported by the listing. Status is per
    /// student and cannot be changed this way.
    pub async fn update_assignment(
        &self,
        actor: &Actor,
        key: Uuid,
        patch: &TaskPatch,
    ) -> TaskResult<Assignment> {
        require_instructor(actor)?;

        if patch.status.is_some() {
            return Err(TaskError::Validation(
                "Status is tracked per student and cannot be updated for a whole assignment."
                    .to_string(),
            ));
        }

        let mut instances = self.find_assignment(actor, key).await?;

        if !patch.is_empty() {
            for task in instances.iter_mut() {
                patch.apply_to(task);
            }

            instances = self.store.save_tasks(&instances).await?;

            info!(
                assignment = %key,
                count = instances.len(),
                "Assignment updated for all students"
            );
        }

        let views = self.populate(instances).await?;
        grouping::group_assignments(&views)
            .into_iter()
            .next()
            .ok_or_else(assignment_not_found)
    }

    /// Deletes every instance of an assignment; returns how many were removed
    pub async fn delete_assignment(&self, actor: &Actor, key: Uuid) -> TaskResult<u64> {
        require_instructor(actor)?;

        let ids: Vec<Uuid> = self
            .find_assignment(actor, key)
            .await?
            .iter()
            .map(|task| task.id)
            .collect();

        let removed = self.store.delete_tasks(&ids).await?;

        info!(assignment = %key, count = removed, "Assignment deleted for all students");
        Ok(removed)
    }

    /// Dashboard counters for the actor's role
    pub async fn summary(&self, actor: &Actor) -> TaskResult<TaskSummary> {
        let tasks = self.visible_tasks(actor).await?;

        Ok(match actor.role {
            Role::Student => TaskSummary::for_student(actor.user_id, &tasks),
            Role::Instructor => TaskSummary::for_instructor(&tasks),
        })
    }

    async fn find_task(&self, task_id: Uuid) -> TaskResult<Task> {
        self.store
            .find_task(task_id)
            .await?
            .ok_or_else(task_not_found)
    }

    /// Resolves an assignment key to its instances
    ///
    /// Rows stored without an assignment ID are addressed by the ID of one of
    /// their rows and collected through the composite grouping key.
    async fn find_assignment(&self, actor: &Actor, key: Uuid) -> TaskResult<Vec<Task>> {
        let mut instances = self.store.find_assignment_tasks(key).await?;

        if instances.is_empty() {
            instances = self.find_ungrouped(key).await?;
        }

        if instances.is_empty() {
            return Err(assignment_not_found());
        }

        policy::authorize_assignment(actor, &instances)?;
        Ok(instances)
    }

    async fn find_ungrouped(&self, anchor_id: Uuid) -> TaskResult<Vec<Task>> {
        let Some(anchor) = self
            .store
            .find_task(anchor_id)
            .await?
            .filter(|task| task.assignment_id.is_none())
        else {
            return Ok(Vec::new());
        };

        let siblings = self.store.find_tasks_created_by(anchor.created_by).await?;
        Ok(siblings
            .into_iter()
            .filter(|task| grouping::same_assignment(&anchor, task))
            .collect())
    }

    async fn populate_one(&self, task: Task) -> TaskResult<TaskView> {
        self.populate(vec![task])
            .await?
            .pop()
            .ok_or_else(task_not_found)
    }

    /// Resolves `created_by`/`assigned_to` to user summaries
    ///
    /// Tasks whose users cannot be resolved are dropped with a warning.
    async fn populate(&self, tasks: Vec<Task>) -> TaskResult<Vec<TaskView>> {
        let mut ids: Vec<Uuid> = tasks
            .iter()
            .flat_map(|t| [t.created_by, t.assigned_to])
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let users: HashMap<Uuid, UserSummary> = self
            .store
            .find_user_summaries(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let mut views = Vec::with_capacity(tasks.len());
        for task in tasks {
            match (users.get(&task.created_by), users.get(&task.assigned_to)) {
                (Some(created_by), Some(assigned_to)) => {
                    let (created_by, assigned_to) = (created_by.clone(), assigned_to.clone());
                    views.push(task.into_view(created_by, assigned_to));
                }
                _ => warn!(task_id = %task.id, "Skipping task with unresolved user reference"),
            }
        }

        Ok(views)
    }
}

fn require_instructor(actor: &Actor) -> TaskResult<()> {
    match actor.role {
        Role::Instructor => Ok(()),
        Role::Student => Err(TaskError::Forbidden(
            "Only instructors can manage assignments.".to_string(),
        )),
    }
}

fn task_not_found() -> TaskError {
    TaskError::NotFound("Task not found.".to_string())
}

fn assignment_not_found() -> TaskError {
    TaskError::NotFound("Assignment not found.".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::{MemoryStore, TaskRepository, UserDirectory};
    use serde_json::json;

    struct Fixture {
        store: Arc<MemoryStore>,
        engine: TaskEngine,
        instructor: Actor,
        students: Vec<Actor>,
    }

    async fn add_user(store: &MemoryStore, name: &str, role: Role) -> Actor {
        let user = store
            .create_user(CreateUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".to_string(),
                role,
            })
            .await
            .unwrap();
        Actor::from(&user)
    }

    async fn fixture(student_count: usize) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let instructor = add_user(&store, "Prof", Role::Instructor).await;

        let mut students = Vec::new();
        for i in 0..student_count {
            students.push(add_user(&store, &format!("Student{}", i), Role::Student).await);
        }

        Fixture {
            engine: TaskEngine::new(store.clone()),
            store,
            instructor,
            students,
        }
    }

    fn request(title: &str) -> CreateTaskRequest {
        CreateTaskRequest {
            title: Some(title.to_string()),
            description: Some("Details".to_string()),
            due_date: Some("2025-06-01".to_string()),
            priority: Some("high".to_string()),
        }
    }

    fn patch(body: serde_json::Value) -> TaskPatch {
        TaskPatch::from_json(&body).unwrap()
    }

    #[tokio::test]
    async fn test_fan_out_creates_one_task_per_student() {
        let f = fixture(3).await;

        let created = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();

        assert_eq!(created.len(), 3);
        let mut assignees: Vec<Uuid> = created.iter().map(|t| t.assigned_to.id).collect();
        let mut expected: Vec<Uuid> = f.students.iter().map(|s| s.user_id).collect();
        assignees.sort();
        expected.sort();
        assert_eq!(assignees, expected);

        let assignment_id = created[0].assignment_id;
        assert!(assignment_id.is_some());
        for task in &created {
            assert_eq!(task.assignment_id, assignment_id);
            assert_eq!(task.created_by.id, f.instructor.user_id);
            assert_eq!(task.title, "Essay");
            assert_eq!(task.priority, Priority::High);
            assert_eq!(task.due_date, created[0].due_date);
            assert_eq!(task.status, TaskStatus::Pending);
        }
    }

    #[tokio::test]
    async fn test_fan_out_without_students_creates_nothing() {
        let f = fixture(0).await;

        let err = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap_err();

        assert!(matches!(err, TaskError::NotFound(ref m) if m == "No students found to assign tasks to."));
        assert_eq!(f.store.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_fan_out_is_all_or_nothing() {
        let f = fixture(5).await;
        f.store.fail_after(Some(3)).await;

        let err = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap_err();

        assert!(matches!(err, TaskError::Store(_)));
        assert_eq!(f.store.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_personal_task_identity() {
        let f = fixture(1).await;
        let me = f.students[0];

        let created = f.engine.create_task(&me, request("Flashcards")).await.unwrap();

        assert_eq!(created.len(), 1);
        assert_eq!(created[0].created_by.id, me.user_id);
        assert_eq!(created[0].assigned_to.id, me.user_id);
        assert!(created[0].assignment_id.is_none());
    }

    #[tokio::test]
    async fn test_create_validation() {
        let f = fixture(1).await;
        let me = f.students[0];

        let mut missing = request("x");
        missing.description = Some("   ".to_string());
        let err = f.engine.create_task(&me, missing).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(ref m) if m == "Please fill all required fields."));

        let mut bad_priority = request("x");
        bad_priority.priority = Some("urgent".to_string());
        assert!(matches!(
            f.engine.create_task(&me, bad_priority).await,
            Err(TaskError::Validation(_))
        ));

        let mut bad_date = request("x");
        bad_date.due_date = Some("tomorrow".to_string());
        assert!(matches!(
            f.engine.create_task(&me, bad_date).await,
            Err(TaskError::Validation(_))
        ));

        assert!(matches!(
            f.engine.create_task(&me, request(&"x".repeat(201))).await,
            Err(TaskError::Validation(_))
        ));

        assert_eq!(f.store.task_count().await, 0);
    }

    #[tokio::test]
    async fn test_read_partitioning() {
        let f = fixture(2).await;
        let (s0, s1) = (f.students[0], f.students[1]);

        f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();
        f.engine.create_task(&s0, request("Mine")).await.unwrap();
        f.engine.create_task(&s1, request("Theirs")).await.unwrap();

        let visible = f.engine.read_tasks(&s0, &TaskFilter::default()).await.unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|t| t.assigned_to.id == s0.user_id));

        let visible = f.engine.read_tasks(&f.instructor, &TaskFilter::default()).await.unwrap();
        assert_eq!(visible.len(), 2);
        assert!(visible.iter().all(|t| t.created_by.id == f.instructor.user_id));
    }

    #[tokio::test]
    async fn test_read_filter() {
        let f = fixture(2).await;

        f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();
        f.engine.create_task(&f.instructor, request("Lab")).await.unwrap();

        let lab = TaskFilter { search: Some("LAB".to_string()), ..Default::default() };
        assert_eq!(f.engine.read_tasks(&f.instructor, &lab).await.unwrap().len(), 2);

        let by_student = TaskFilter { search: Some("student1".to_string()), ..Default::default() };
        assert_eq!(f.engine.read_tasks(&f.instructor, &by_student).await.unwrap().len(), 2);

        let done = TaskFilter { status: Some(TaskStatus::Completed), ..Default::default() };
        assert!(f.engine.read_tasks(&f.instructor, &done).await.unwrap().is_empty());

        let low = TaskFilter { priority: Some(Priority::Low), ..Default::default() };
        assert!(f.engine.read_tasks(&f.instructor, &low).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_student_status_only_update_on_assigned_task() {
        let f = fixture(1).await;
        let me = f.students[0];
        let task = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap().remove(0);

        let err = f
            .engine
            .update_task(&me, task.id, &patch(json!({"status": "completed", "priority": "high"})))
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::Forbidden(_)));

        let updated = f
            .engine
            .update_task(&me, task.id, &patch(json!({"status": "completed"})))
            .await
            .unwrap();
        assert_eq!(updated.status, TaskStatus::Completed);
        assert_eq!(updated.title, task.title);
        assert_eq!(updated.priority, task.priority);
        assert_eq!(updated.due_date, task.due_date);
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let f = fixture(1).await;

        let err = f
            .engine
            .update_task(&f.students[0], Uuid::new_v4(), &patch(json!({"status": "completed"})))
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::NotFound(ref m) if m == "Task not found."));
    }

    #[tokio::test]
    async fn test_delete_scoping() {
        let f = fixture(3).await;
        let other = add_user(&f.store, "Other", Role::Instructor).await;
        let created = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();

        assert!(matches!(
            f.engine.delete_task(&other, created[0].id).await,
            Err(TaskError::Forbidden(_))
        ));
        assert!(matches!(
            f.engine.delete_task(&f.students[0], created[0].id).await,
            Err(TaskError::Forbidden(_))
        ));

        f.engine.delete_task(&f.instructor, created[0].id).await.unwrap();

        let remaining = f.store.all_tasks().await;
        assert_eq!(remaining.len(), 2);
        for sibling in &created[1..] {
            let stored = remaining.iter().find(|t| t.id == sibling.id).unwrap();
            assert_eq!(stored.title, sibling.title);
            assert_eq!(stored.status, sibling.status);
        }
    }

    #[tokio::test]
    async fn test_list_students_instructor_only() {
        let f = fixture(2).await;

        let students = f.engine.list_students(&f.instructor).await.unwrap();
        assert_eq!(students.len(), 2);
        assert!(students.iter().all(|s| s.role == Role::Student));

        let err = f.engine.list_students(&f.students[0]).await.unwrap_err();
        assert!(matches!(err, TaskError::Forbidden(ref m) if m == "Only instructors can view students."));
    }

    #[tokio::test]
    async fn test_list_assignments_progress() {
        let f = fixture(4).await;
        let created = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();

        let first = created.iter().find(|t| t.assigned_to.id == f.students[0].user_id).unwrap();
        f.engine
            .update_task(&f.students[0], first.id, &patch(json!({"status": "completed"})))
            .await
            .unwrap();

        let assignments = f.engine.list_assignments(&f.instructor).await.unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].total_count, 4);
        assert_eq!(assignments[0].completed_count, 1);
        assert_eq!(assignments[0].progress, 25.0);

        assert!(f.engine.list_assignments(&f.students[0]).await.is_err());
    }

    #[tokio::test]
    async fn test_update_assignment_preserves_statuses() {
        let f = fixture(2).await;
        let created = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();
        let assignment_id = created[0].assignment_id.unwrap();

        let own = created
            .iter()
            .find(|t| t.assigned_to.id == f.students[0].user_id)
            .unwrap();
        f.engine
            .update_task(&f.students[0], own.id, &patch(json!({"status": "completed"})))
            .await
            .unwrap();

        let shared = patch(json!({"title": "Long essay", "priority": "low"}));
        let updated = f
            .engine
            .update_assignment(&f.instructor, assignment_id, &shared)
            .await
            .unwrap();

        assert_eq!(updated.title, "Long essay");
        assert_eq!(updated.priority, Priority::Low);
        assert_eq!(updated.completed_count, 1);

        let stored = f.store.all_tasks().await;
        assert!(stored.iter().all(|t| t.title == "Long essay" && t.priority == Priority::Low));
        assert_eq!(stored.iter().filter(|t| t.status == TaskStatus::Completed).count(), 1);
    }

    #[tokio::test]
    async fn test_update_assignment_rejections() {
        let f = fixture(2).await;
        let other = add_user(&f.store, "Other", Role::Instructor).await;
        let created = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();
        let assignment_id = created[0].assignment_id.unwrap();

        let status = patch(json!({"status": "completed"}));
        let rename = patch(json!({"title": "x"}));

        assert!(matches!(
            f.engine.update_assignment(&f.instructor, assignment_id, &status).await,
            Err(TaskError::Validation(_))
        ));
        assert!(matches!(
            f.engine.update_assignment(&other, assignment_id, &rename).await,
            Err(TaskError::Forbidden(_))
        ));
        assert!(matches!(
            f.engine.update_assignment(&f.instructor, Uuid::new_v4(), &rename).await,
            Err(TaskError::NotFound(_))
        ));
        assert!(matches!(
            f.engine.update_assignment(&f.students[0], assignment_id, &rename).await,
            Err(TaskError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_assignment_removes_only_its_instances() {
        let f = fixture(3).await;
        let essay = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();
        f.engine.create_task(&f.instructor, request("Lab")).await.unwrap();
        f.engine.create_task(&f.students[0], request("Mine")).await.unwrap();

        let removed = f
            .engine
            .delete_assignment(&f.instructor, essay[0].assignment_id.unwrap())
            .await
            .unwrap();

        assert_eq!(removed, 3);
        let remaining = f.store.all_tasks().await;
        assert_eq!(remaining.len(), 4);
        assert!(remaining.iter().all(|t| t.title != "Essay"));
    }

    #[tokio::test]
    async fn test_rows_without_assignment_id_are_addressed_by_key() {
        let f = fixture(2).await;
        f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();

        let legacy = f.students.iter().map(|s| NewTask {
            assignment_id: None,
            created_by: f.instructor.user_id,
            assigned_to: s.user_id,
            title: "Legacy".to_string(),
            description: "Details".to_string(),
            due_date: chrono::Utc::now(),
            priority: Priority::Low,
        });
        f.store.insert_tasks(legacy.collect()).await.unwrap();

        let groups = f.engine.list_assignments(&f.instructor).await.unwrap();
        let group = groups.iter().find(|g| g.assignment_id.is_none()).unwrap();
        assert_eq!(group.total_count, 2);

        let other = add_user(&f.store, "Other", Role::Instructor).await;
        assert!(matches!(
            f.engine.delete_assignment(&other, group.key).await,
            Err(TaskError::Forbidden(_))
        ));

        let renamed = f
            .engine
            .update_assignment(&f.instructor, group.key, &patch(json!({"priority": "high"})))
            .await
            .unwrap();
        assert_eq!(renamed.total_count, 2);
        assert_eq!(renamed.priority, Priority::High);

        let removed = f.engine.delete_assignment(&f.instructor, group.key).await.unwrap();
        assert_eq!(removed, 2);

        let remaining = f.store.all_tasks().await;
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|t| t.title == "Essay"));
    }

    #[tokio::test]
    async fn test_empty_patch_skips_the_write() {
        let f = fixture(1).await;
        let me = f.students[0];
        let mine = f.engine.create_task(&me, request("Mine")).await.unwrap();
        let assigned = f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();

        f.store.fail_all().await;

        let unchanged = f
            .engine
            .update_task(&me, mine[0].id, &patch(json!({})))
            .await
            .unwrap();
        assert_eq!(unchanged, mine[0]);

        let group = f
            .engine
            .update_assignment(
                &f.instructor,
                assigned[0].assignment_id.unwrap(),
                &patch(json!({})),
            )
            .await
            .unwrap();
        assert_eq!(group.title, "Essay");

        // still not status-only
        assert!(matches!(
            f.engine.update_task(&me, assigned[0].id, &patch(json!({}))).await,
            Err(TaskError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_summary_per_role() {
        let f = fixture(2).await;
        let me = f.students[0];

        f.engine.create_task(&f.instructor, request("Essay")).await.unwrap();
        let mine = f.engine.create_task(&me, request("Mine")).await.unwrap();
        f.engine
            .update_task(&me, mine[0].id, &patch(json!({"status": "completed"})))
            .await
            .unwrap();

        match f.engine.summary(&me).await.unwrap() {
            TaskSummary::Student { personal, assigned } => {
                assert_eq!((personal.total, personal.completed), (1, 1));
                assert_eq!((assigned.total, assigned.pending), (1, 1));
            }
            other => panic!("unexpected summary {:?}", other),
        }

        assert_eq!(
            f.engine.summary(&f.instructor).await.unwrap(),
            TaskSummary::Instructor { assignments: 1, students: 2, completed: 0, pending: 2 }
        );
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let f = fixture(1).await;
        let created = f.engine.create_task(&f.students[0], request("Mine")).await.unwrap();
        f.store.fail_all().await;

        let err = f.engine.delete_task(&f.students[0], created[0].id).await.unwrap_err();
        assert!(matches!(err, TaskError::Store(StoreError::Unavailable(_))));
        assert!(f.store.find_task(created[0].id).await.unwrap().is_some());
    }
}
