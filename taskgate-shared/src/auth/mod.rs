/// Authentication
///
/// # Modules
///
/// - [`password`]: Argon2id hashing and verification
/// - [`session`]: session tokens, resolution and expiry
/// - [`flow`]: registration and login built on the two above
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use taskgate_shared::auth::{flow::{AuthFlow, LoginInput}, session::SessionManager};
/// use taskgate_shared::db::Stores;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stores = Stores::in_memory();
/// let sessions = SessionManager::new(stores.sessions.clone(), 3600);
/// let auth = AuthFlow::new(stores.users.clone(), sessions);
///
/// let (identity, token) = auth
///     .login(LoginInput { email: "u@x.com".into(), password: "p1".into() })
///     .await?;
/// # Ok(())
/// # }
/// ```

pub mod flow;
pub mod password;
pub mod session;
