/// In-memory store implementations
///
/// Used by the test suites and for running the server without PostgreSQL.
/// Each store serializes through a `tokio::sync::RwLock`; operations that must
/// be atomic (duplicate-checked insert, flash drain) run under one write guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::models::{
    session::{Flash, SessionRecord, SessionStore},
    task::{Task, TaskStore},
    user::{CreateUser, User, UserStore},
};

/// [`UserStore`] backed by a map keyed on normalized email
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn insert(&self, data: CreateUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;

        if users.contains_key(&data.email) {
            return Err(StoreError::DuplicateEmail);
        }

        let user = User {
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            created_at: Utc::now(),
        };
        users.insert(user.email.clone(), user.clone());

        Ok(user)
    }
}

/// [`TaskStore`] holding tasks in insertion order
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds tasks; the web app itself never writes tasks
    pub async fn extend(&self, tasks: impl IntoIterator<Item = Task>) {
        self.tasks.write().await.extend(tasks);
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list_by_role(&self, role: &str) -> Result<Vec<Task>, StoreError> {
        Ok(self
            .tasks
            .read()
            .await
            .iter()
            .filter(|task| task.role == role)
            .cloned()
            .collect())
    }
}

/// [`SessionStore`] keyed on token digest
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(record.id_hash.clone(), record);
        Ok(())
    }

    async fn find_active(
        &self,
        id_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(id_hash)
            .filter(|record| !record.is_expired_at(now))
            .cloned())
    }

    async fn delete(&self, id_hash: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id_hash);
        Ok(())
    }

    async fn push_flash(
        &self,
        id_hash: &str,
        flash: Flash,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(id_hash) {
            Some(record) if !record.is_expired_at(now) => {
                record.flash.push(flash);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn take_flashes(
        &self,
        id_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Flash>, StoreError> {
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(id_hash) {
            Some(record) if !record.is_expired_at(now) => Ok(std::mem::take(&mut record.flash)),
            _ => Ok(Vec::new()),
        }
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(now));

        Ok((before - sessions.len()) as u64)
    }
}
