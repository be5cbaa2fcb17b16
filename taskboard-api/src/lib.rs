//! # Taskboard API Server Library
//!
//! HTTP surface of the taskboard: session auth, task CRUD with instructor
//! fan-out, and assignment management.
//!
//! ## Modules
//!
//! - `app`: Application state, router builder and session middleware
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
