/// Common test utilities for integration tests
///
/// This module provides shared infrastructure for integration tests:
/// - In-memory storage behind the real router
/// - Test user creation with ready-made session tokens
/// - Request helpers returning status, headers and JSON body

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use taskboard_api::app::{build_router, AppState};
use taskboard_api::config::{ApiConfig, Config, DatabaseConfig, SessionConfig};
use taskboard_shared::auth::jwt::{create_token, Claims};
use taskboard_shared::models::user::{CreateUser, Role, User};
use taskboard_shared::store::{MemoryStore, UserDirectory};
use tower::Service as _;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-chars";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: axum::Router,
    pub config: Config,
}

/// A user plus a valid session token for them
pub struct TestUser {
    pub user: User,
    pub token: String,
}

impl TestUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["http://localhost:5173".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
        },
        session: SessionConfig {
            jwt_secret: TEST_SECRET.to_string(),
            ttl_hours: 1,
        },
    }
}

impl TestContext {
    /// Creates a new test context over an empty in-memory store
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();

        let state = AppState::new(store.clone(), config.clone());
        let app = build_router(state);

        TestContext { store, app, config }
    }

    /// Inserts a user directly into storage and signs a session for them
    ///
    /// The password hash is a placeholder; use the register endpoint when a
    /// test needs to log in.
    pub async fn create_user(&self, name: &str, role: Role) -> anyhow::Result<TestUser> {
        let user = self
            .store
            .create_user(CreateUser {
                name: name.to_string(),
                email: format!("{}-{}@example.edu", name.to_lowercase(), Uuid::new_v4()),
                password_hash: "unused".to_string(),
                role,
            })
            .await?;

        let claims = Claims::new(user.id, self.config.session.ttl());
        let token = create_token(&claims, TEST_SECRET)?;

        Ok(TestUser { user, token })
    }

    pub async fn instructor(&self, name: &str) -> TestUser {
        self.create_user(name, Role::Instructor).await.unwrap()
    }

    pub async fn student(&self, name: &str) -> TestUser {
        self.create_user(name, Role::Student).await.unwrap()
    }

    /// Sends a request and returns status, headers and the parsed JSON body
    ///
    /// The session travels in the `jwt` cookie, like a browser would send it.
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, HeaderMap, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("jwt={}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.call(request).await
    }

    /// Sends a prepared request through the router
    pub async fn call(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.app.clone().call(request).await.unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, headers, json)
    }

    pub async fn get(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        let (status, _, body) = self.send("GET", uri, Some(&user.token), None).await;
        (status, body)
    }

    pub async fn post(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self.send("POST", uri, Some(&user.token), Some(body)).await;
        (status, body)
    }

    pub async fn put(&self, uri: &str, user: &TestUser, body: Value) -> (StatusCode, Value) {
        let (status, _, body) = self.send("PUT", uri, Some(&user.token), Some(body)).await;
        (status, body)
    }

    pub async fn delete(&self, uri: &str, user: &TestUser) -> (StatusCode, Value) {
        let (status, _, body) = self.send("DELETE", uri, Some(&user.token), None).await;
        (status, body)
    }
}

/// A complete, valid create body
pub fn task_body(title: &str) -> Value {
    serde_json::json!({
        "title": title,
        "description": format!("{} description", title),
        "dueDate": "2030-05-01",
        "priority": "medium"
    })
}

/// Extracts the `jwt` cookie value from a `Set-Cookie` header
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            cookie
                .split(';')
                .next()
                .and_then(|pair| pair.trim().strip_prefix("jwt="))
                .map(str::to_string)
        })
}
