/// Data models and their store traits
///
/// # Models
///
/// - `user`: registered accounts and the credential store
/// - `task`: role-scoped tasks (read-only)
/// - `session`: server-side sessions, identities and flash messages
///
/// Each model defines a store trait plus its PostgreSQL implementation.
/// In-memory implementations live in [`crate::db::memory`].

pub mod session;
pub mod task;
pub mod user;
