//! Caller-facing errors of the portal service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error returned by authentication, registration and profile operations
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed or empty request; the message names the offending field
    #[error("{0}")]
    InvalidInput(String),

    /// Unknown email or wrong password. Deliberately says nothing more.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The account store or session store could not be reached
    #[error("Service temporarily unavailable")]
    StoreUnavailable(String),

    /// Too many login attempts for this account
    #[error("Too many login attempts, try again later")]
    RateLimited,

    /// No active session for this client
    #[error("Login required")]
    Unauthenticated,

    /// The requested record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unexpected failure inside the service itself
    #[error("Internal server error")]
    Internal,
}

impl AuthError {
    /// Whether the caller may retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::StoreUnavailable(_) | AuthError::RateLimited)
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        error!("Store failure: {}", err);
        AuthError::StoreUnavailable(err.to_string())
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "success": false,
            "message": self.to_string(),
            "retryable": self.is_retryable(),
        }));

        (self.status(), body).into_response()
    }
}

/// Type alias for portal results
pub type AuthResult<T> = Result<T, AuthError>;
