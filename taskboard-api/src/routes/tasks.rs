/// Task endpoints
///
/// # Endpoints
///
/// - `GET /api/tasks` - Tasks visible to the caller (`?status&priority&search`)
/// - `POST /api/tasks` - Personal task (student) or fan-out (instructor)
/// - `GET /api/tasks/summary` - Dashboard counters
/// - `PUT /api/tasks/:id` - Partial update
/// - `DELETE /api/tasks/:id` - Delete one task
///
/// All routes require a session; the caller arrives as an [`Actor`]
/// extension inserted by the session layer.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;
use taskboard_shared::{
    models::{task::TaskView, user::Role},
    tasks::{Actor, CreateTaskRequest, TaskFilter, TaskPatch, TaskSummary},
};
use uuid::Uuid;

/// Create response
#[derive(Debug, Serialize)]
pub struct CreateTaskResponse {
    pub message: String,

    /// Number of records created (1 for a personal task)
    pub count: usize,

    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskView>,
}

#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub message: String,
    pub task: TaskView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Creates a task
///
/// # Endpoint
///
/// ```text
/// POST /api/tasks
/// Content-Type: application/json
///
/// {
///   "title": "Lab report",
///   "description": "Write up experiment 3",
///   "dueDate": "2025-03-01",
///   "priority": "high"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing field, unknown priority or bad date
/// - `404 Not Found`: Instructor with no students to assign to
pub async fn create_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateTaskResponse>)> {
    let Json(request) = payload?;

    let tasks = state.engine.create_task(&actor, request).await?;

    let message = match actor.role {
        Role::Instructor => format!("Task created for {} students successfully.", tasks.len()),
        Role::Student => "Personal task created successfully.".to_string(),
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateTaskResponse {
            message,
            count: tasks.len(),
            tasks,
        }),
    ))
}

/// Lists the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    filter: Result<Query<TaskFilter>, QueryRejection>,
) -> ApiResult<Json<TaskListResponse>> {
    let Query(filter) = filter?;

    let tasks = state.engine.read_tasks(&actor, &filter).await?;
    Ok(Json(TaskListResponse { tasks }))
}

/// Dashboard counters for the caller's role
pub async fn task_summary(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<TaskSummary>> {
    Ok(Json(state.engine.summary(&actor).await?))
}

/// Partially updates a task
///
/// The body may carry any of `title`, `description`, `dueDate`, `priority`
/// and `status`. A student working on an instructor's task may only send
/// `status`.
///
/// # Errors
///
/// - `400 Bad Request`: Malformed body or field value
/// - `403 Forbidden`: Caller may not change this task (or these fields)
/// - `404 Not Found`: No such task
pub async fn update_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<TaskResponse>> {
    let Path(task_id) = id?;
    let Json(body) = payload?;

    let patch = TaskPatch::from_json(&body).map_err(ApiError::BadRequest)?;
    let task = state.engine.update_task(&actor, task_id, &patch).await?;

    Ok(Json(TaskResponse {
        message: "Task updated successfully".to_string(),
        task,
    }))
}

/// Deletes a single task
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(task_id) = id?;

    state.engine.delete_task(&actor, task_id).await?;

    Ok(Json(MessageResponse {
        message: "Task deleted successfully".to_string(),
    }))
}
