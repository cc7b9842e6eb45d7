/// Database layer
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool with health checks
/// - `migrations`: embedded schema migrations
/// - `memory`: in-memory store implementations
///
/// [`Stores`] bundles one implementation of each store trait so the web
/// layer can be wired against PostgreSQL or memory without knowing which.
///
/// # Example
///
/// ```no_run
/// use taskgate_shared::db::{pool::{create_pool, DatabaseConfig}, Stores};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig {
///     url: std::env::var("DATABASE_URL")?,
///     ..Default::default()
/// })
/// .await?;
///
/// let stores = Stores::postgres(pool);
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod migrations;
pub mod pool;

use sqlx::PgPool;
use std::sync::Arc;

use crate::error::StoreError;
use crate::models::{
    session::{PgSessionStore, SessionStore},
    task::{PgTaskStore, TaskStore},
    user::{PgUserStore, UserStore},
};

/// One handle per store, cheap to clone
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub sessions: Arc<dyn SessionStore>,

    /// Present when backed by PostgreSQL
    pub pool: Option<PgPool>,
}

impl Stores {
    /// PostgreSQL stores sharing one pool
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(pool.clone())),
            tasks: Arc::new(PgTaskStore::new(pool.clone())),
            sessions: Arc::new(PgSessionStore::new(pool.clone())),
            pool: Some(pool),
        }
    }

    /// Fresh, empty in-memory stores
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(memory::MemoryUserStore::new()),
            tasks: Arc::new(memory::MemoryTaskStore::new()),
            sessions: Arc::new(memory::MemorySessionStore::new()),
            pool: None,
        }
    }

    /// Checks the backing database, if any
    pub async fn health_check(&self) -> Result<(), StoreError> {
        match &self.pool {
            Some(pool) => Ok(pool::health_check(pool).await?),
            None => Ok(()),
        }
    }
}
