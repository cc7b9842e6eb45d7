/// Task model and read-only task store
///
/// Tasks are written by an external process. The web app only lists them for
/// the role carried by the caller's session.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     role TEXT NOT NULL,
///     title TEXT NOT NULL,
///     fields JSONB NOT NULL DEFAULT '{}'::jsonb,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;

/// A role-scoped task
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Role allowed to see this task
    pub role: String,

    pub title: String,

    /// Free-form attributes set by the producer
    pub fields: JsonValue,

    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Builds a task with a fresh ID, used by seeders and tests
    pub fn new(role: impl Into<String>, title: impl Into<String>, fields: JsonValue) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: role.into(),
            title: title.into(),
            fields,
            created_at: Utc::now(),
        }
    }
}

/// Read access to tasks
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Lists every task whose role equals `role` exactly
    ///
    /// No pagination. Order follows creation time.
    async fn list_by_role(&self, role: &str) -> Result<Vec<Task>, StoreError>;
}

/// PostgreSQL-backed [`TaskStore`]
#[derive(Debug, Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list_by_role(&self, role: &str) -> Result<Vec<Task>, StoreError> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, role, title, fields, created_at
            FROM tasks
            WHERE role = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(role)
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }
}
