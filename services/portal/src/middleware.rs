//! Session resolution for incoming requests

use axum::{
    Form, Json, async_trait,
    body::Body,
    extract::{FromRequest, FromRequestParts},
    http::{Request, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{error::AuthError, session::SessionContext, state::AppState};

/// Resolve the client's session from its cookie
///
/// Reuses the context `require_session` already placed in the request
/// extensions, so a protected request reads the session store only once.
#[async_trait]
impl FromRequestParts<AppState> for SessionContext {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(context) = parts.extensions.get::<SessionContext>() {
            return Ok(context.clone());
        }

        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(&state.config.session_cookie_name)
            .map(|cookie| cookie.value().to_string());

        Ok(SessionContext::resume(state.sessions.clone(), token).await?)
    }
}

/// Reject requests without an active session
pub async fn require_session(
    session: SessionContext,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    if !session.is_active() {
        debug!("Rejected {} without a session", req.uri().path());
        return Err(AuthError::Unauthenticated);
    }

    req.extensions_mut().insert(session);
    Ok(next.run(req).await)
}

/// Request body accepted either as JSON or as an urlencoded form
///
/// Any rejection (missing or wrong content type, malformed body, a field of
/// the wrong type) becomes `AuthError::InvalidInput`.
pub struct Payload<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        let payload = if is_form {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| value)
                .map_err(|rejection| rejection.body_text())
        } else {
            Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| value)
                .map_err(|rejection| rejection.body_text())
        };

        payload.map(Payload).map_err(|message| {
            debug!("Rejected request body: {}", message);
            AuthError::InvalidInput(message)
        })
    }
}
