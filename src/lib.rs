pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;

use api::create_api_router;
use auth::propagate_reissued_token;
use axum::{Router, middleware};
use db::Database;
use jwt::JwtConfig;
use rate_limit::{RateLimitConfig, RateLimitQuotas};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Token codec, built from explicit key material at startup
    pub jwt: Arc<JwtConfig>,
    /// Per-IP quotas for the login and registration endpoints
    pub rate_limits: RateLimitQuotas,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let rate_limits = Arc::new(RateLimitConfig::new(&config.rate_limits));

    let api_router = create_api_router(config.db.clone(), config.jwt.clone(), rate_limits)
        .layer(middleware::from_fn(propagate_reissued_token));

    Router::new().nest("/api", api_router)
}

/// Run the server on the given listener. This function blocks until the
/// server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
