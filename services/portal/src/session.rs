//! Session management
//!
//! A `SessionStore` keeps `AuthenticatedSession` records under opaque tokens.
//! A `SessionContext` is one client's view of it for the duration of a
//! request: the token from the client's cookie plus the session it resolves to.

use async_trait::async_trait;
use common::{StoreError, StoreResult, cache::RedisPool};
use rand::{Rng, distributions::Alphanumeric};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::models::{AuthenticatedSession, Identity};

const TOKEN_LENGTH: usize = 48;

/// Generate an unguessable session token
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Storage for authenticated sessions, keyed by token
///
/// Expiry is the store's concern.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a new session and return its token
    async fn create(&self, session: &AuthenticatedSession) -> StoreResult<String>;

    /// Fetch a live session
    async fn load(&self, token: &str) -> StoreResult<Option<AuthenticatedSession>>;

    /// Replace the contents of an existing session
    async fn save(&self, token: &str, session: &AuthenticatedSession) -> StoreResult<()>;

    /// Remove a session; removing an unknown token is not an error
    async fn destroy(&self, token: &str) -> StoreResult<()>;

    /// Whether the backing store is reachable
    async fn ping(&self) -> StoreResult<bool>;
}

/// Sessions kept in Redis as JSON, expiring by TTL
#[derive(Clone)]
pub struct RedisSessionStore {
    redis_pool: RedisPool,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    pub fn new(redis_pool: RedisPool, ttl_seconds: u64) -> Self {
        Self {
            redis_pool,
            ttl_seconds,
        }
    }

    fn key(token: &str) -> String {
        format!("session:{}", token)
    }
}

fn encode(session: &AuthenticatedSession) -> StoreResult<String> {
    serde_json::to_string(session).map_err(|e| StoreError::Serialization(e.to_string()))
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, session: &AuthenticatedSession) -> StoreResult<String> {
        let token = generate_token();
        self.save(&token, session).await?;
        Ok(token)
    }

    async fn load(&self, token: &str) -> StoreResult<Option<AuthenticatedSession>> {
        let key = Self::key(token);
        let Some(raw) = self.redis_pool.get(&key).await? else {
            return Ok(None);
        };

        let session = serde_json::from_str(&raw)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        // Sliding expiry: activity keeps the session alive.
        self.redis_pool.touch(&key, self.ttl_seconds).await?;
        Ok(Some(session))
    }

    async fn save(&self, token: &str, session: &AuthenticatedSession) -> StoreResult<()> {
        self.redis_pool
            .set(&Self::key(token), &encode(session)?, Some(self.ttl_seconds))
            .await
    }

    async fn destroy(&self, token: &str) -> StoreResult<()> {
        self.redis_pool.delete(&Self::key(token)).await
    }

    async fn ping(&self) -> StoreResult<bool> {
        self.redis_pool.health_check().await
    }
}

/// How often `MemorySessionStore` sweeps out expired sessions
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

struct MemorySessions {
    entries: HashMap<String, (AuthenticatedSession, Instant)>,
    last_purge: Instant,
}

impl MemorySessions {
    fn purge_expired(&mut self, now: Instant) {
        let before = self.entries.len();
        self.entries.retain(|_, (_, expires)| *expires > now);
        self.last_purge = now;

        let purged = before - self.entries.len();
        if purged > 0 {
            debug!("Purged {} expired sessions", purged);
        }
    }
}

/// Process-local session store
///
/// Expired sessions are dropped when loaded, and swept out in bulk on the
/// first save after each `PURGE_INTERVAL`.
#[derive(Clone)]
pub struct MemorySessionStore {
    ttl: Duration,
    sessions: Arc<Mutex<MemorySessions>>,
}

impl MemorySessionStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_seconds),
            sessions: Arc::new(Mutex::new(MemorySessions {
                entries: HashMap::new(),
                last_purge: Instant::now(),
            })),
        }
    }

    async fn save_at(&self, token: &str, session: &AuthenticatedSession, now: Instant) {
        let mut sessions = self.sessions.lock().await;
        if now.duration_since(sessions.last_purge) >= PURGE_INTERVAL {
            sessions.purge_expired(now);
        }
        sessions
            .entries
            .insert(token.to_string(), (session.clone(), now + self.ttl));
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, session: &AuthenticatedSession) -> StoreResult<String> {
        let token = generate_token();
        self.save(&token, session).await?;
        Ok(token)
    }

    async fn load(&self, token: &str) -> StoreResult<Option<AuthenticatedSession>> {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        match sessions.entries.get_mut(token) {
            Some((session, expires)) if *expires > now => {
                *expires = now + self.ttl;
                Ok(Some(session.clone()))
            }
            Some(_) => {
                sessions.entries.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn save(&self, token: &str, session: &AuthenticatedSession) -> StoreResult<()> {
        self.save_at(token, session, Instant::now()).await;
        Ok(())
    }

    async fn destroy(&self, token: &str) -> StoreResult<()> {
        self.sessions.lock().await.entries.remove(token);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

/// One client's session for the duration of a request
#[derive(Clone)]
pub struct SessionContext {
    store: Arc<dyn SessionStore>,
    token: Option<String>,
    current: Option<AuthenticatedSession>,
}

impl SessionContext {
    /// Resolve the client's token, if any, against the store
    ///
    /// An unknown or expired token yields an anonymous context that still
    /// remembers the stale token so it can be cleared.
    pub async fn resume(store: Arc<dyn SessionStore>, token: Option<String>) -> StoreResult<Self> {
        let current = match token.as_deref() {
            Some(token) => store.load(token).await?,
            None => None,
        };

        Ok(Self {
            store,
            token,
            current,
        })
    }

    /// Bind the client to `identity`
    ///
    /// Always issues a fresh token; any session the client held before is
    /// destroyed.
    pub async fn establish(&mut self, identity: &Identity) -> StoreResult<()> {
        if let Some(previous) = self.token.take() {
            self.store.destroy(&previous).await?;
        }

        let session = AuthenticatedSession::new(identity);
        let token = self.store.create(&session).await?;
        info!("Session established for account {}", identity.account_id);

        self.token = Some(token);
        self.current = Some(session);
        Ok(())
    }

    /// End the client's session
    pub async fn clear(&mut self) -> StoreResult<()> {
        if let Some(token) = self.token.take() {
            self.store.destroy(&token).await?;
        }
        if let Some(session) = self.current.take() {
            info!("Session cleared for account {}", session.account_id);
        }
        Ok(())
    }

    /// Change the display name held by the active session
    pub async fn rename(&mut self, display_name: &str) -> StoreResult<()> {
        let (Some(token), Some(session)) = (self.token.as_deref(), self.current.as_mut()) else {
            debug!("Rename requested without an active session");
            return Ok(());
        };

        session.display_name = display_name.to_string();
        self.store.save(token, session).await
    }

    pub fn current(&self) -> Option<&AuthenticatedSession> {
        self.current.as_ref()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}
