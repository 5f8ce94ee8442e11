//! Login throttling against password guessing

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of attempts allowed per window
    pub max_attempts: u32,
    /// Time window in seconds
    pub window_seconds: u64,
    /// Ban duration in seconds
    pub ban_duration_seconds: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window_seconds: 300,       // 5 minutes
            ban_duration_seconds: 900, // 15 minutes
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    attempts: u32,
    /// Start of the current window
    window_start: Instant,
    ban_expires: Option<Instant>,
}

impl RateLimiterEntry {
    /// Whether the entry no longer affects any decision
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        match self.ban_expires {
            Some(ban_expires) => now >= ban_expires,
            None => now.duration_since(self.window_start) >= window,
        }
    }
}

#[derive(Debug)]
struct Attempts {
    entries: HashMap<String, RateLimiterEntry>,
    last_purge: Instant,
}

/// Per-key attempt counter with temporary bans
///
/// Stale entries are purged at most once per window, on the next attempt.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    attempts: Arc<Mutex<Attempts>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            attempts: Arc::new(Mutex::new(Attempts {
                entries: HashMap::new(),
                last_purge: Instant::now(),
            })),
        }
    }

    /// Record an attempt for `key` and report whether it may proceed
    pub async fn is_allowed(&self, key: &str) -> bool {
        self.is_allowed_at(key, Instant::now()).await
    }

    async fn is_allowed_at(&self, key: &str, now: Instant) -> bool {
        let window = Duration::from_secs(self.config.window_seconds);
        let mut attempts = self.attempts.lock().await;

        if now.duration_since(attempts.last_purge) >= window {
            let before = attempts.entries.len();
            attempts.entries.retain(|_, entry| !entry.is_stale(now, window));
            attempts.last_purge = now;
            debug!(
                "Purged {} stale login throttling entries",
                before - attempts.entries.len()
            );
        }

        let entry = attempts.entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            attempts: 0,
            window_start: now,
            ban_expires: None,
        });

        if let Some(ban_expires) = entry.ban_expires {
            if now >= ban_expires {
                entry.attempts = 0;
                entry.window_start = now;
                entry.ban_expires = None;
            } else {
                return false;
            }
        }

        if now.duration_since(entry.window_start) >= window {
            entry.attempts = 0;
            entry.window_start = now;
        }

        if entry.attempts >= self.config.max_attempts {
            entry.ban_expires = Some(now + Duration::from_secs(self.config.ban_duration_seconds));
            warn!(
                "Throttling logins for {} for {} seconds",
                key, self.config.ban_duration_seconds
            );
            return false;
        }

        entry.attempts += 1;
        true
    }

    /// Forget all attempts for `key`, e.g. after a successful login
    pub async fn reset(&self, key: &str) {
        if self.attempts.lock().await.entries.remove(key).is_some() {
            info!("Cleared login attempts for {}", key);
        }
    }
}
