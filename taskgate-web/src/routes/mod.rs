/// Route handlers
///
/// - `pages`: landing page and the register/login forms
/// - `auth`: register, login and logout actions
/// - `dashboard`: role-scoped task listing
/// - `health`: health check endpoint

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod pages;
