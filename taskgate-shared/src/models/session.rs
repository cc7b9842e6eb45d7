/// Session records and the session store
///
/// A session is keyed by the SHA-256 digest of the opaque token held in the
/// browser cookie; the token itself is never persisted. Authenticated sessions
/// carry an [`Identity`]. Anonymous sessions exist only to hold queued
/// [`Flash`] messages for visitors who have not logged in.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id_hash TEXT PRIMARY KEY,
///     user_email TEXT,
///     user_role TEXT,
///     flash JSONB NOT NULL DEFAULT '[]'::jsonb,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL
/// );
/// ```
///
/// Every read takes `now` explicitly and ignores rows whose `expires_at` is
/// not in the future, so an expired row behaves as absent even before the
/// reaper deletes it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};

use crate::error::StoreError;

/// The authenticated principal bound to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub role: String,
}

/// Flash message severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// One-shot notice shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

impl Flash {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }
}

/// A stored session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Hex SHA-256 of the session token
    pub id_hash: String,

    /// None for anonymous sessions
    pub identity: Option<Identity>,

    /// Pending flash messages, oldest first
    pub flash: Vec<Flash>,

    pub created_at: DateTime<Utc>,

    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Returns true if the session is no longer valid at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Persistence for sessions
///
/// Implementations must make `take_flashes` atomic: two concurrent callers
/// never both receive the same message.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a new session
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError>;

    /// Fetches a session that is still valid at `now`
    async fn find_active(
        &self,
        id_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Removes a session. Removing an unknown session is not an error.
    async fn delete(&self, id_hash: &str) -> Result<(), StoreError>;

    /// Appends a flash to a valid session, returning false if there is none
    async fn push_flash(
        &self,
        id_hash: &str,
        flash: Flash,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Removes and returns all pending flashes of a valid session
    async fn take_flashes(&self, id_hash: &str, now: DateTime<Utc>)
        -> Result<Vec<Flash>, StoreError>;

    /// Deletes every session expired at `now`, returning how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id_hash: String,
    user_email: Option<String>,
    user_role: Option<String>,
    flash: Json<Vec<Flash>>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for SessionRecord {
    fn from(row: SessionRow) -> Self {
        let identity = match (row.user_email, row.user_role) {
            (Some(email), Some(role)) => Some(Identity { email, role }),
            _ => None,
        };

        Self {
            id_hash: row.id_hash,
            identity,
            flash: row.flash.0,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

/// PostgreSQL-backed [`SessionStore`]
#[derive(Debug, Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError> {
        let (email, role) = match record.identity {
            Some(identity) => (Some(identity.email), Some(identity.role)),
            None => (None, None),
        };

        sqlx::query(
            r#"
            INSERT INTO sessions (id_hash, user_email, user_role, flash, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(record.id_hash)
        .bind(email)
        .bind(role)
        .bind(Json(record.flash))
        .bind(record.created_at)
        .bind(record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_active(
        &self,
        id_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id_hash, user_email, user_role, flash, created_at, expires_at
            FROM sessions
            WHERE id_hash = $1 AND expires_at > $2
            "#,
        )
        .bind(id_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(SessionRecord::from))
    }

    async fn delete(&self, id_hash: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sessions WHERE id_hash = $1")
            .bind(id_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn push_flash(
        &self,
        id_hash: &str,
        flash: Flash,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET flash = flash || $2
            WHERE id_hash = $1 AND expires_at > $3
            "#,
        )
        .bind(id_hash)
        .bind(Json(vec![flash]))
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn take_flashes(
        &self,
        id_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Flash>, StoreError> {
        // Lock the row, then clear it; RETURNING yields the pre-update queue
        let drained: Option<(Json<Vec<Flash>>,)> = sqlx::query_as(
            r#"
            WITH drained AS (
                SELECT id_hash, flash
                FROM sessions
                WHERE id_hash = $1 AND expires_at > $2
                FOR UPDATE
            )
            UPDATE sessions AS s
            SET flash = '[]'::jsonb
            FROM drained AS d
            WHERE s.id_hash = d.id_hash
            RETURNING d.flash
            "#,
        )
        .bind(id_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(drained.map(|(flash,)| flash.0).unwrap_or_default())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
