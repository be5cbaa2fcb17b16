/// Authentication endpoints
///
/// This module provides the session lifecycle:
/// - Registration
/// - Login
/// - Logout
/// - Current user
///
/// # Endpoints
///
/// - `POST /api/auth/register` - Register and start a session
/// - `POST /api/auth/login` - Login and start a session
/// - `POST /api/auth/logout` - Clear the session cookie
/// - `GET /api/auth/me` - Profile of the signed-in user
///
/// Sessions are HS256 tokens carried in the `jwt` cookie (HttpOnly,
/// SameSite=Strict, Secure in production).

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    auth::{jwt, password, session},
    models::user::{normalize_email, CreateUser, Role, User, UserProfile},
};
use tracing::{debug, info};
use validator::Validate;

/// Register request
///
/// Fields are optional so a missing one yields a single friendly message.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    /// Password (at least 6 characters)
    pub password: Option<String>,

    /// `student` (default) or `instructor`
    pub role: Option<String>,
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response of register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,

    #[serde(flatten)]
    pub user: UserProfile,
}

fn required(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn start_session(state: &AppState, user: &User) -> ApiResult<String> {
    let claims = jwt::Claims::new(user.id, state.config.session.ttl());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(session::session_cookie(
        &token,
        state.config.session.max_age_secs(),
        state.config.api.production,
    ))
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/register
/// Content-Type: application/json
///
/// {
///   "name": "Ada Lovelace",
///   "email": "ada@example.edu",
///   "password": "secret1",
///   "role": "instructor"
/// }
/// ```
///
/// # Response
///
/// `201 Created` with `Set-Cookie: jwt=...` and
///
/// ```json
/// {
///   "message": "User created successfully",
///   "id": "uuid",
///   "name": "Ada Lovelace",
///   "email": "ada@example.edu",
///   "role": "instructor"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing field, bad email, short password or unknown role
/// - `409 Conflict`: Email already exists
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    let (Some(name), Some(email), Some(plain_password)) = (
        required(&req.name),
        required(&req.email),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Please fill all the fields".to_string()));
    };

    req.validate()?;

    password::validate_password(plain_password).map_err(|message| {
        ApiError::ValidationError(vec![ValidationErrorDetail {
            field: "password".to_string(),
            message,
        }])
    })?;

    let role = match required(&req.role) {
        None => Role::Student,
        Some(raw) => raw
            .parse::<Role>()
            .map_err(|_| ApiError::BadRequest("Invalid role specified.".to_string()))?,
    };

    let password_hash = password::hash_password(plain_password)?;

    let user = state
        .store
        .create_user(CreateUser {
            name: name.to_string(),
            email: normalize_email(email),
            password_hash,
            role,
        })
        .await?;

    info!(user_id = %user.id, role = %user.role, "User registered");

    let cookie = start_session(&state, &user)?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "User created successfully".to_string(),
            user: UserProfile::from(&user),
        }),
    ))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /api/auth/login
/// Content-Type: application/json
///
/// {
///   "email": "ada@example.edu",
///   "password": "secret1"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Missing field
/// - `401 Unauthorized`: Unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;

    let (Some(email), Some(plain_password)) = (
        required(&req.email),
        req.password.as_deref().filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::BadRequest("Please fill all the fields".to_string()));
    };

    let invalid = || ApiError::Unauthorized("Invalid credentials".to_string());

    let user = state
        .store
        .find_user_by_email(&normalize_email(email))
        .await?
        .ok_or_else(|| {
            debug!("Login attempt for unknown email");
            invalid()
        })?;

    if !password::verify_password(plain_password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login attempt with wrong password");
        return Err(invalid());
    }

    info!(user_id = %user.id, "User logged in");

    let cookie = start_session(&state, &user)?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Login successful".to_string(),
            user: UserProfile::from(&user),
        }),
    ))
}

/// Clears the session cookie
///
/// Always succeeds, signed in or not.
pub async fn logout() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, session::clear_session_cookie())],
        Json(serde_json::json!({ "message": "Logout successful" })),
    )
}

/// Profile of the authenticated user
pub async fn me(Extension(user): Extension<User>) -> Json<UserProfile> {
    Json(UserProfile::from(&user))
}
