/// API route handlers
///
/// Handlers are organized by resource:
///
/// - `health`: health check endpoint
/// - `auth`: registration, login, logout and current user
/// - `tasks`: task CRUD and dashboard summary
/// - `students`: student listing for instructors
/// - `assignments`: grouped fan-outs, edited or deleted for all students

pub mod assignments;
pub mod auth;
pub mod health;
pub mod students;
pub mod tasks;
