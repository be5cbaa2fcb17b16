/// Student listing
///
/// `GET /api/students` returns `{ "students": [{id, name, email, role}] }`
/// to instructors and `403` to students.

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Extension, Json};
use serde::Serialize;
use taskboard_shared::{models::user::UserProfile, tasks::Actor};

#[derive(Debug, Serialize)]
pub struct StudentListResponse {
    pub students: Vec<UserProfile>,
}

pub async fn list_students(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<StudentListResponse>> {
    let students = state.engine.list_students(&actor).await?;
    Ok(Json(StudentListResponse { students }))
}
