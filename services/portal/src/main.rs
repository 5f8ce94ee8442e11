use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod authenticator;
mod config;
mod credential;
mod error;
mod middleware;
mod models;
mod rate_limiter;
mod repositories;
mod routes;
mod session;
mod state;
mod validation;

use common::{
    cache::{RedisConfig, RedisPool},
    database::{self, DatabaseConfig},
};

use crate::{
    config::{PortalConfig, SessionBackend},
    repositories::PgAccountRepository,
    session::{MemorySessionStore, RedisSessionStore, SessionStore},
};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting portal service");

    let config = PortalConfig::load()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = database::init_pool(&db_config).await?;

    if database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let sessions: Arc<dyn SessionStore> = match config.session_backend {
        SessionBackend::Redis => {
            let redis_config = RedisConfig::from_env()?;
            let redis_pool = RedisPool::new(&redis_config).await?;
            if !redis_pool.health_check().await? {
                anyhow::bail!("Failed to connect to Redis");
            }
            Arc::new(RedisSessionStore::new(
                redis_pool,
                config.session_ttl_seconds,
            ))
        }
        SessionBackend::Memory => {
            info!("Using in-process session storage");
            Arc::new(MemorySessionStore::new(config.session_ttl_seconds))
        }
    };

    let accounts = Arc::new(PgAccountRepository::new(pool));
    let bind_address = config.bind_address.clone();
    let app_state = AppState::new(config, accounts, sessions);

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Portal service listening on {}", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
