/// Session lifecycle: issue, resolve, destroy
///
/// # Tokens
///
/// - **Format**: `tg_{43 chars}` (prefix + 43 random base62 chars, ~256 bits)
/// - **Storage**: only the SHA-256 hex digest of the token is persisted
/// - **Lifetime**: fixed TTL from creation; activity does not extend it
///
/// Resolution fails open: a missing, malformed, unknown, expired or anonymous
/// token resolves to `None`. Only store I/O failures are errors.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use taskgate_shared::auth::session::SessionManager;
/// use taskgate_shared::db::memory::MemorySessionStore;
/// use taskgate_shared::models::session::Identity;
///
/// # async fn example() -> Result<(), taskgate_shared::error::StoreError> {
/// let sessions = SessionManager::new(Arc::new(MemorySessionStore::new()), 3600);
/// let identity = Identity { email: "u@x.com".into(), role: "admin".into() };
///
/// let token = sessions.create(identity.clone()).await?;
/// assert_eq!(sessions.resolve(token.as_str()).await?, Some(identity));
///
/// sessions.destroy(token.as_str()).await?;
/// assert_eq!(sessions.resolve(token.as_str()).await?, None);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::error::StoreError;
use crate::models::session::{Flash, Identity, SessionRecord, SessionStore};

const TOKEN_PREFIX: &str = "tg_";
const TOKEN_RANDOM_LENGTH: usize = 43;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Total length of a session token
pub const TOKEN_LENGTH: usize = TOKEN_PREFIX.len() + TOKEN_RANDOM_LENGTH;

/// Default session lifetime in seconds
pub const DEFAULT_TTL_SECONDS: i64 = 3600;

/// Opaque session token handed to the client
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let random: String = (0..TOKEN_RANDOM_LENGTH)
            .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
            .collect();

        Self(format!("{}{}", TOKEN_PREFIX, random))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

// Keep tokens out of logs
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Checks prefix, length and alphabet of a client-supplied token
pub fn validate_token_format(token: &str) -> bool {
    token.len() == TOKEN_LENGTH
        && token
            .strip_prefix(TOKEN_PREFIX)
            .is_some_and(|random| random.bytes().all(|b| b.is_ascii_alphanumeric()))
}

/// Hex SHA-256 digest used as the storage key
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Issues and resolves sessions over a [`SessionStore`]
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    ttl: Duration,
}

impl SessionManager {
    /// Creates a manager whose sessions live `ttl_seconds`
    pub fn new(store: Arc<dyn SessionStore>, ttl_seconds: i64) -> Self {
        Self {
            store,
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    async fn start(
        &self,
        identity: Option<Identity>,
        flash: Vec<Flash>,
    ) -> Result<SessionToken, StoreError> {
        let token = SessionToken::generate();
        let now = Utc::now();

        self.store
            .insert(SessionRecord {
                id_hash: hash_token(token.as_str()),
                identity,
                flash,
                created_at: now,
                expires_at: now + self.ttl,
            })
            .await?;

        Ok(token)
    }

    /// Creates an authenticated session bound to `identity`
    pub async fn create(&self, identity: Identity) -> Result<SessionToken, StoreError> {
        let email = identity.email.clone();
        let token = self.start(Some(identity), Vec::new()).await?;

        tracing::info!(email = %email, "Session created");
        Ok(token)
    }

    /// Resolves a token to the identity it was created for
    pub async fn resolve(&self, token: &str) -> Result<Option<Identity>, StoreError> {
        if !validate_token_format(token) {
            return Ok(None);
        }

        let record = self
            .store
            .find_active(&hash_token(token), Utc::now())
            .await?;

        Ok(record.and_then(|record| record.identity))
    }

    /// Destroys a session; unknown or malformed tokens are ignored
    pub async fn destroy(&self, token: &str) -> Result<(), StoreError> {
        if !validate_token_format(token) {
            return Ok(());
        }

        self.store.delete(&hash_token(token)).await?;
        tracing::debug!("Session destroyed");
        Ok(())
    }

    /// Queues a flash message
    ///
    /// When `token` does not name a live session, an anonymous session holding
    /// the message is started and its token returned so the caller can set the
    /// cookie. Returns `None` when the existing session was used.
    pub async fn flash(
        &self,
        token: Option<&str>,
        flash: Flash,
    ) -> Result<Option<SessionToken>, StoreError> {
        if let Some(token) = token.filter(|t| validate_token_format(t)) {
            if self
                .store
                .push_flash(&hash_token(token), flash.clone(), Utc::now())
                .await?
            {
                return Ok(None);
            }
        }

        self.start(None, vec![flash]).await.map(Some)
    }

    /// Drains the pending flash messages of a session
    pub async fn take_flashes(&self, token: &str) -> Result<Vec<Flash>, StoreError> {
        if !validate_token_format(token) {
            return Ok(Vec::new());
        }

        self.store.take_flashes(&hash_token(token), Utc::now()).await
    }

    /// Deletes expired sessions
    pub async fn purge_expired(&self) -> Result<u64, StoreError> {
        self.store.purge_expired(Utc::now()).await
    }
}

/// Periodically purges expired sessions until `shutdown` is cancelled
///
/// Purge failures are logged and retried on the next tick.
pub async fn run_reaper(
    sessions: SessionManager,
    interval: std::time::Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    tracing::info!(interval_secs = interval.as_secs(), "Session reaper started");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("Session reaper stopped");
                return;
            }
            _ = ticker.tick() => {
                match sessions.purge_expired().await {
                    Ok(0) => {}
                    Ok(purged) => tracing::info!(purged, "Purged expired sessions"),
                    Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
                }
            }
        }
    }
}
