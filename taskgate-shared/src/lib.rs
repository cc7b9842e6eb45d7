//! # Taskgate Shared Library
//!
//! Domain types, stores and authentication logic used by the Taskgate web
//! server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, sessions and the register/login flow
//! - `db`: connection pool, migrations, store bundle and in-memory stores
//! - `models`: users, tasks and sessions with their store traits
//! - `error`: store error type

pub mod auth;
pub mod db;
pub mod error;
pub mod models;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
