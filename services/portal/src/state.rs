//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    authenticator::Authenticator, config::PortalConfig, rate_limiter::RateLimiter,
    repositories::AccountStore, session::SessionStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PortalConfig>,
    pub accounts: Arc<dyn AccountStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub authenticator: Authenticator,
}

impl AppState {
    pub fn new(
        config: PortalConfig,
        accounts: Arc<dyn AccountStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let rate_limiter = RateLimiter::new(config.rate_limiter());
        let authenticator = Authenticator::new(accounts.clone(), rate_limiter);

        Self {
            config: Arc::new(config),
            accounts,
            sessions,
            authenticator,
        }
    }
}
