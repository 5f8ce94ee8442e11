//! Infrastructure error types shared by the services
//!
//! Every failure to reach or use PostgreSQL or Redis is reported as a
//! `StoreError`. Services translate it into their own caller-facing errors.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Error raised by the persistent store or the session cache
#[derive(Error, Debug)]
pub enum StoreError {
    /// Could not open a connection to the database
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// A statement failed or timed out
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Redis could not be reached or rejected a command
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// A stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Store configuration error: {0}")]
    Configuration(String),
}

impl From<SqlxError> for StoreError {
    fn from(err: SqlxError) -> Self {
        match err {
            SqlxError::PoolTimedOut | SqlxError::PoolClosed | SqlxError::Io(_) => {
                StoreError::Connection(err)
            }
            other => StoreError::Query(other),
        }
    }
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
