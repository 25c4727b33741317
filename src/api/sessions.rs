//! Session API endpoints.
//!
//! - POST `/` - Log in, returning an access/refresh token pair
//! - GET `/` - List the caller's valid sessions
//! - DELETE `/` - Log out the session bound to the caller's token

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::USER_AGENT},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::auth::{Auth, AuthService};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::rate_limit::{RateLimitConfig, rate_limit_login};

#[derive(Clone)]
pub struct SessionsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(SessionsState);

pub fn router(state: SessionsState, rate_limits: Arc<RateLimitConfig>) -> Router {
    let login_router = Router::new()
        .route("/", post(create_session))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(rate_limits, rate_limit_login));

    Router::new()
        .route("/", get(list_sessions).delete(delete_session))
        .with_state(state)
        .merge(login_router)
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenPairResponse {
    access_token: String,
    refresh_token: String,
}

/// Log in with email and password. Creates a fresh session and returns a
/// signed access/refresh token pair bound to it. Denial is a bare 401
/// regardless of cause.
async fn create_session(
    State(state): State<SessionsState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let pair = AuthService::new(&state.db, &state.jwt)
        .login(&payload.email, &payload.password, user_agent)
        .await
        .service_err("Failed to log in")?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    Ok((
        StatusCode::CREATED,
        Json(TokenPairResponse {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        }),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    id: String,
    user: String,
    user_agent: String,
    valid: bool,
    created_at: String,
    updated_at: String,
}

/// List the caller's valid sessions.
async fn list_sessions(
    State(state): State<SessionsState>,
    Auth(user): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let sessions = AuthService::new(&state.db, &state.jwt)
        .list_active_sessions(&user.claims.sub)
        .await
        .service_err("Failed to list sessions")?;

    let sessions: Vec<SessionResponse> = sessions
        .into_iter()
        .map(|s| SessionResponse {
            id: s.uuid,
            user: s.user_uuid,
            user_agent: s.user_agent,
            valid: s.valid,
            created_at: s.created_at,
            updated_at: s.updated_at,
        })
        .collect();

    Ok(Json(sessions))
}

/// Log out: revoke the session embedded in the caller's token claims.
/// Idempotent; a second logout of the same session still succeeds.
async fn delete_session(
    State(state): State<SessionsState>,
    Auth(user): Auth,
) -> Result<impl IntoResponse, ApiError> {
    let session_uuid = user
        .claims
        .session
        .ok_or_else(|| ApiError::unauthorized("Token carries no session"))?;

    AuthService::new(&state.db, &state.jwt)
        .revoke_session(&session_uuid)
        .await
        .service_err("Failed to revoke session")?;

    Ok(Json(serde_json::json!({
        "accessToken": null,
        "refreshToken": null,
    })))
}
