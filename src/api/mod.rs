mod error;
mod products;
mod sessions;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    rate_limits: Arc<RateLimitConfig>,
) -> Router {
    let users_state = users::UsersState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let sessions_state = sessions::SessionsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let products_state = products::ProductsState { db, jwt };

    Router::new()
        .nest("/users", users::router(users_state, rate_limits.clone()))
        .nest("/sessions", sessions::router(sessions_state, rate_limits))
        .nest("/products", products::router(products_state))
}
