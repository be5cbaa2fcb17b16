/// Assignment endpoints (instructors only)
///
/// An assignment is the set of per-student tasks produced by one fan-out,
/// addressed by its `assignmentId`.
///
/// # Endpoints
///
/// - `GET /api/assignments` - Grouped assignments with per-student progress
/// - `PUT /api/assignments/:id` - Edit shared fields for every student
/// - `DELETE /api/assignments/:id` - Delete for every student

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use serde::Serialize;
use serde_json::Value;
use taskboard_shared::tasks::{Actor, Assignment, TaskPatch};
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct AssignmentListResponse {
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentResponse {
    pub message: String,
    pub assignment: Assignment,
}

#[derive(Debug, Serialize)]
pub struct AssignmentDeleteResponse {
    pub message: String,

    /// Instances removed
    pub count: u64,
}

pub async fn list_assignments(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<AssignmentListResponse>> {
    let assignments = state.engine.list_assignments(&actor).await?;
    Ok(Json(AssignmentListResponse { assignments }))
}

/// Applies `title`, `description`, `dueDate` and `priority` to every instance
///
/// Each student's `status` is preserved; sending `status` is a `400`.
pub async fn update_assignment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<AssignmentResponse>> {
    let Path(assignment_id) = id?;
    let Json(body) = payload?;

    let patch = TaskPatch::from_json(&body).map_err(ApiError::BadRequest)?;
    let assignment = state
        .engine
        .update_assignment(&actor, assignment_id, &patch)
        .await?;

    Ok(Json(AssignmentResponse {
        message: format!(
            "Assignment updated for {} students successfully.",
            assignment.total_count
        ),
        assignment,
    }))
}

pub async fn delete_assignment(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<AssignmentDeleteResponse>> {
    let Path(assignment_id) = id?;

    let count = state.engine.delete_assignment(&actor, assignment_id).await?;

    Ok(Json(AssignmentDeleteResponse {
        message: format!("Assignment deleted for {} students successfully.", count),
        count,
    }))
}
