//! Redis cache module for the study partner portal
//!
//! Thin wrapper over a multiplexed Redis connection. All keys are namespaced
//! with the configured prefix so several deployments can share one server.

use redis::{AsyncCommands, Client};
use tracing::info;

use crate::error::StoreResult;

/// Configuration for Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Prefix prepended to every key
    pub key_prefix: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `REDIS_KEY_PREFIX`: Key namespace (default: "portal")
    pub fn from_env() -> StoreResult<Self> {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let key_prefix =
            std::env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "portal".to_string());

        Ok(RedisConfig { url, key_prefix })
    }
}

/// Redis connection handle
#[derive(Clone)]
pub struct RedisPool {
    client: Client,
    key_prefix: String,
}

impl RedisPool {
    /// Initialize a new Redis client
    pub async fn new(config: &RedisConfig) -> StoreResult<Self> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisPool {
            client,
            key_prefix: config.key_prefix.clone(),
        })
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}:{}", self.key_prefix, key)
    }

    async fn get_connection(&self) -> StoreResult<redis::aio::MultiplexedConnection> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Set a key-value pair with optional TTL
    pub async fn set(&self, key: &str, value: &str, ttl_seconds: Option<u64>) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let key = self.namespaced(key);

        if let Some(ttl) = ttl_seconds {
            let _: () = conn.set_ex(key, value, ttl).await?;
        } else {
            let _: () = conn.set(key, value).await?;
        }

        Ok(())
    }

    /// Get a value by key
    pub async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(value)
    }

    /// Reset the time-to-live of an existing key
    pub async fn touch(&self, key: &str, ttl_seconds: u64) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let ttl = i64::try_from(ttl_seconds).unwrap_or(i64::MAX);
        let _: bool = conn.expire(self.namespaced(key), ttl).await?;
        Ok(())
    }

    /// Delete a key
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        let mut conn = self.get_connection().await?;
        let _: u64 = conn.del(self.namespaced(key)).await?;
        Ok(())
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> StoreResult<bool> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}
