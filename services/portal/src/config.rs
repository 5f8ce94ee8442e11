//! Service configuration
//!
//! Values are layered: built-in defaults, then an optional `portal.toml` in
//! the working directory, then `PORTAL_*` environment variables
//! (e.g. `PORTAL_SESSION_TTL_SECONDS=3600`).

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::rate_limiter::RateLimiterConfig;

/// 31 days, the lifetime of a "permanent" session in the previous deployment
const DEFAULT_SESSION_TTL_SECONDS: i64 = 31 * 24 * 60 * 60;

/// Where authenticated sessions are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    Redis,
    /// Process-local; sessions do not survive a restart
    Memory,
}

/// Portal service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    pub bind_address: String,
    pub session_backend: SessionBackend,
    pub session_ttl_seconds: u64,
    pub session_cookie_name: String,
    /// Mark the session cookie `Secure` (HTTPS only)
    pub cookie_secure: bool,
    pub login_max_attempts: u32,
    pub login_window_seconds: u64,
    pub login_ban_seconds: u64,
}

impl PortalConfig {
    /// Load the configuration from defaults, `portal.toml` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_address", "0.0.0.0:5001")?
            .set_default("session_backend", "redis")?
            .set_default("session_ttl_seconds", DEFAULT_SESSION_TTL_SECONDS)?
            .set_default("session_cookie_name", "portal_session")?
            .set_default("cookie_secure", false)?
            .set_default("login_max_attempts", 5)?
            .set_default("login_window_seconds", 300)?
            .set_default("login_ban_seconds", 900)?
            .add_source(File::with_name("portal").required(false))
            .add_source(Environment::with_prefix("PORTAL").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Login throttling settings
    pub fn rate_limiter(&self) -> RateLimiterConfig {
        RateLimiterConfig {
            max_attempts: self.login_max_attempts,
            window_seconds: self.login_window_seconds,
            ban_duration_seconds: self.login_ban_seconds,
        }
    }
}
