//! User API endpoints.
//!
//! - POST `/` - Register a new user
//! - GET `/me` - Identity of the current caller

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::auth::{Auth, password::hash_password};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::rate_limit::{RateLimitConfig, rate_limit_register};

#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState, rate_limits: Arc<RateLimitConfig>) -> Router {
    let register_router = Router::new()
        .route("/", post(create_user))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            rate_limits,
            rate_limit_register,
        ));

    Router::new()
        .route("/me", get(current_user))
        .with_state(state)
        .merge(register_router)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateUserRequest {
    name: String,
    email: String,
    password: String,
    password_confirmation: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UserResponse {
    id: String,
    email: String,
    name: String,
    created_at: String,
    updated_at: String,
}

/// Characters the password policy counts as special.
const PASSWORD_SPECIALS: &str = "!@#$%^&*";

fn validate_password(password: &str) -> Result<(), &'static str> {
    let len = password.chars().count();
    if !(8..=16).contains(&len) {
        return Err("Password must be 8-16 characters long");
    }
    if !password
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SPECIALS.contains(c))
    {
        return Err("Password may only contain letters, numbers, and !@#$%^&*");
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err("Password must contain a lowercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err("Password must contain an uppercase letter");
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err("Password must contain a digit");
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        return Err("Password must contain a special character");
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@')
}

async fn create_user(
    State(state): State<UsersState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    let email = payload.email.trim();

    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }

    if !is_valid_email(email) {
        return Err(ApiError::bad_request("Not a valid email"));
    }

    validate_password(&payload.password).map_err(ApiError::bad_request)?;

    if payload.password != payload.password_confirmation {
        return Err(ApiError::bad_request("Passwords do not match"));
    }

    let existing = state
        .db
        .users()
        .get_by_email(email)
        .await
        .db_err("Failed to check email availability")?;
    if existing.is_some() {
        return Err(ApiError::conflict("Email is already registered"));
    }

    let password_hash =
        hash_password(&payload.password).service_err("Failed to hash password")?;

    let uuid = uuid::Uuid::new_v4().to_string();
    state
        .db
        .users()
        .create(&uuid, email, name, &password_hash)
        .await
        .db_err("Failed to create user")?;

    let user = state
        .db
        .users()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load created user")?
        .ok_or_else(|| ApiError::internal("Failed to load created user"))?;

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.uuid,
            email: user.email,
            name: user.name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }),
    ))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CurrentUserResponse {
    id: String,
    email: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<String>,
}

/// Return the identity attached to the request by the authentication
/// gate. Taken from the token claims; no database round trip.
async fn current_user(Auth(user): Auth) -> impl IntoResponse {
    Json(CurrentUserResponse {
        id: user.claims.sub,
        email: user.claims.email,
        name: user.claims.name,
        session: user.claims.session,
    })
}
