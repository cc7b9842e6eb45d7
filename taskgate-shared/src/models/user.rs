/// User model and credential store
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     email TEXT NOT NULL,
///     password_hash TEXT NOT NULL,
///     role TEXT NOT NULL DEFAULT 'user',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email),
///     CONSTRAINT users_email_normalized CHECK (email = lower(btrim(email)) AND email <> '')
/// );
/// ```
///
/// Emails reach the store already normalized (see [`normalize_email`]); the
/// store does exact, case-sensitive matching only.
///
/// # Example
///
/// ```no_run
/// use taskgate_shared::models::user::{CreateUser, PgUserStore, UserStore};
/// use taskgate_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let users = PgUserStore::new(pool);
///
/// users.insert(CreateUser {
///     email: "u@x.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     role: "admin".to_string(),
/// }).await?;
///
/// let found = users.find_by_email("u@x.com").await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::StoreError;

/// Role given to accounts registered without one
pub const DEFAULT_ROLE: &str = "user";

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Normalized email, unique across users
    pub email: String,

    /// Argon2id PHC digest, never the plaintext
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Free-form lower-case role string
    pub role: String,

    /// When the account was registered
    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Normalized email
    pub email: String,

    /// Argon2id digest
    pub password_hash: String,

    /// Normalized role
    pub role: String,
}

/// Trims surrounding whitespace and lower-cases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trims and lower-cases a role, falling back to [`DEFAULT_ROLE`] when empty
pub fn normalize_role(role: Option<&str>) -> String {
    match role.map(str::trim) {
        Some(role) if !role.is_empty() => role.to_lowercase(),
        _ => DEFAULT_ROLE.to_string(),
    }
}

/// Persistence for user records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Finds a user by exact normalized email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DuplicateEmail` if the email is already taken.
    /// The check is performed by the store atomically with the insert.
    async fn insert(&self, data: CreateUser) -> Result<User, StoreError>;
}

/// PostgreSQL-backed [`UserStore`]
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT email, password_hash, role, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert(&self, data: CreateUser) -> Result<User, StoreError> {
        // users_email_key turns a concurrent duplicate into StoreError::DuplicateEmail
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING email, password_hash, role, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.role)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(email = %user.email, role = %user.role, "User inserted");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("A@B.com "), "a@b.com");
        assert_eq!(normalize_email("  u@X.COM\t"), "u@x.com");
        assert_eq!(normalize_email("a@b.com"), "a@b.com");
    }

    #[test]
    fn test_normalize_role_defaults_to_user() {
        assert_eq!(normalize_role(None), "user");
        assert_eq!(normalize_role(Some("")), "user");
        assert_eq!(normalize_role(Some("   ")), "user");
    }

    #[test]
    fn test_normalize_role_lowercases() {
        assert_eq!(normalize_role(Some("Admin")), "admin");
        assert_eq!(normalize_role(Some(" EDITOR ")), "editor");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            email: "u@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: "admin".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "u@x.com");
    }
}
