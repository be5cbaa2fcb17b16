/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskboard_api::{app::{build_router, AppState}, config::Config};
/// use taskboard_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:5001").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use taskboard_shared::{
    auth::{jwt, session},
    store::Storage,
    tasks::{Actor, TaskEngine},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, Level};

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// User and task storage
    pub store: Arc<dyn Storage>,

    /// Task engine over the same storage
    pub engine: TaskEngine,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn Storage>, config: Config) -> Self {
        Self {
            engine: TaskEngine::new(store.clone()),
            store,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.session.jwt_secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                  # Health check (public)
/// └── /api/
///     ├── /auth/
///     │   ├── POST /register       # public
///     │   ├── POST /login          # public
///     │   ├── POST /logout         # public
///     │   └── GET  /me             # session
///     ├── /tasks                   # session
///     │   ├── GET    /             # list visible tasks
///     │   ├── POST   /             # create (personal or fan-out)
///     │   ├── GET    /summary      # dashboard counters
///     │   ├── PUT    /:id
///     │   └── DELETE /:id
///     ├── GET /students            # session, instructors only
///     └── /assignments             # session, instructors only
///         ├── GET    /
///         ├── PUT    /:id
///         └── DELETE /:id
/// ```
///
/// Layers, outermost first: CORS, request tracing, then session
/// authentication on the protected routes.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", post(routes::auth::logout));

    let session_auth_routes = Router::new()
        .route("/me", get(routes::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let protected_routes = Router::new()
        .route(
            "/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route("/tasks/summary", get(routes::tasks::task_summary))
        .route(
            "/tasks/:id",
            put(routes::tasks::update_task).delete(routes::tasks::delete_task),
        )
        .route("/students", get(routes::students::list_students))
        .route("/assignments", get(routes::assignments::list_assignments))
        .route(
            "/assignments/:id",
            put(routes::assignments::update_assignment)
                .delete(routes::assignments::delete_assignment),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            session_auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(session_auth_routes))
        .merge(protected_routes);

    let cors = if state.config.api.cors_origins.iter().any(|o| o == "*") {
        // Development mode: permissive CORS (no credentials)
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Session authentication middleware layer
///
/// Reads the session token from the `jwt` cookie (or a Bearer header),
/// validates it, loads the user and injects both the [`Actor`] and the
/// `User` into request extensions. The role always comes from storage.
async fn session_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session::token_from_headers(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Unauthorized - No token provided".to_string()))?;

    let claims = jwt::validate_token(&token, state.jwt_secret())?;

    let user = state
        .store
        .find_user_by_id(claims.sub)
        .await?
        .ok_or_else(|| {
            debug!(user_id = %claims.sub, "Session refers to a missing user");
            ApiError::Unauthorized("Unauthorized - User not found".to_string())
        })?;

    req.extensions_mut().insert(Actor::from(&user));
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
