//! # Taskgate Web Server Library
//!
//! Session-authenticated web app: registration, login, a role-scoped task
//! dashboard and logout.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration management
//! - `error`: error handling and HTTP response mapping
//! - `middleware`: security headers and the session extractor
//! - `routes`: route handlers
//! - `templates`: embedded HTML views

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod templates;
