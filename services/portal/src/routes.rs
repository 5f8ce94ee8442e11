//! Portal service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{
    AppState,
    config::PortalConfig,
    error::AuthError,
    middleware::{Payload, require_session},
    models::{ProfileUpdate, RegistrationRequest},
    session::SessionContext,
    validation,
};

/// Where the browser goes after logging in
const LANDING_PAGE: &str = "/dashboard";

/// Request for user login
#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Create the router for the portal service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/profile/current", get(current_profile))
        .route("/api/profile", put(update_profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout).get(logout))
        .route("/auth/check", get(check))
        .merge(protected_routes)
        .with_state(state)
}

fn session_cookie(config: &PortalConfig, token: &str) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), token.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure)
        .build()
}

fn with_session_cookie(jar: CookieJar, config: &PortalConfig, session: &SessionContext) -> CookieJar {
    match session.token() {
        Some(token) => jar.add(session_cookie(config, token)),
        None => jar,
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = state.accounts.ping().await.unwrap_or(false);
    let sessions = state.sessions.ping().await.unwrap_or(false);

    let (status, label) = if database && sessions {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "portal",
            "database": database,
            "sessions": sessions,
        })),
    )
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    mut session: SessionContext,
    jar: CookieJar,
    Payload(payload): Payload<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let identity = state
        .authenticator
        .authenticate(&mut session, &payload.email, &payload.password)
        .await?;

    let jar = with_session_cookie(jar, &state.config, &session);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Login successful",
            "user": identity,
            "redirect": LANDING_PAGE,
        })),
    ))
}

/// Registration endpoint; logs the new student in
pub async fn register(
    State(state): State<AppState>,
    mut session: SessionContext,
    jar: CookieJar,
    Payload(payload): Payload<RegistrationRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let identity = state.authenticator.register(&mut session, &payload).await?;

    let jar = with_session_cookie(jar, &state.config, &session);
    Ok((
        jar,
        Json(json!({
            "success": true,
            "message": "Registration successful",
            "user": identity,
            "redirect": LANDING_PAGE,
        })),
    ))
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    mut session: SessionContext,
    jar: CookieJar,
) -> Result<impl IntoResponse, AuthError> {
    state.authenticator.logout(&mut session).await?;

    let removal = Cookie::build((state.config.session_cookie_name.clone(), ""))
        .path("/")
        .build();
    Ok((
        jar.remove(removal),
        Json(json!({"success": true, "message": "Logged out successfully"})),
    ))
}

/// Report who the client is logged in as
pub async fn check(session: SessionContext) -> Result<impl IntoResponse, AuthError> {
    let current = session.current().ok_or(AuthError::Unauthenticated)?;
    Ok(Json(json!({
        "success": true,
        "user": current.identity(),
    })))
}

/// Profile of the logged-in student
pub async fn current_profile(
    State(state): State<AppState>,
    session: SessionContext,
) -> Result<impl IntoResponse, AuthError> {
    let account_id = session
        .current()
        .ok_or(AuthError::Unauthenticated)?
        .account_id;

    let profile = state
        .accounts
        .find_profile(account_id)
        .await?
        .ok_or(AuthError::NotFound("User"))?;

    Ok(Json(json!({"success": true, "data": profile})))
}

/// Partial profile update
pub async fn update_profile(
    State(state): State<AppState>,
    mut session: SessionContext,
    Payload(payload): Payload<ProfileUpdate>,
) -> Result<impl IntoResponse, AuthError> {
    let account_id = session
        .current()
        .ok_or(AuthError::Unauthenticated)?
        .account_id;

    let changes = validation::validate_profile_update(&payload)?;
    if state.accounts.update_profile(account_id, &changes).await? {
        info!("Updated profile of account {}", account_id);

        if let Some(name) = &changes.name {
            if let Err(e) = session.rename(name).await {
                error!("Failed to update session name for account {}: {}", account_id, e);
            }
        }
    }

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
    })))
}
