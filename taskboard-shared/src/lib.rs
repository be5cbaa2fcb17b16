//! # Taskboard Shared Library
//!
//! Domain types, storage and business rules used by the Taskboard API server.
//!
//! ## Module Organization
//!
//! - `models`: database rows and wire views for users and tasks
//! - `db`: connection pool and embedded migrations
//! - `store`: storage traits with PostgreSQL and in-memory backends
//! - `auth`: password hashing, session tokens and cookies
//! - `tasks`: the fan-out and authorization engine

pub mod auth;
pub mod db;
pub mod models;
pub mod store;
pub mod tasks;

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
