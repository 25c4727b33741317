//! Rate limiting for authentication endpoints.
//!
//! Uses a token bucket algorithm with per-IP tracking to prevent brute
//! force attacks on login and registration.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::net::SocketAddr;
use std::{num::NonZeroU32, sync::Arc};

/// Per-IP rate limiter for endpoint-specific limiting.
pub type IpLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

/// Requests-per-minute quotas, carried in the server configuration so
/// tests can relax them.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitQuotas {
    pub login_per_minute: u32,
    pub register_per_minute: u32,
}

impl RateLimitQuotas {
    /// Production defaults: strict enough to blunt brute force, generous
    /// enough for interactive use.
    pub fn standard() -> Self {
        Self {
            login_per_minute: 10,
            register_per_minute: 5,
        }
    }

    /// Effectively unlimited, for test setups.
    pub fn relaxed() -> Self {
        Self {
            login_per_minute: 10_000,
            register_per_minute: 10_000,
        }
    }
}

/// Rate limiting state for authentication endpoints.
#[derive(Clone)]
pub struct RateLimitConfig {
    login: Arc<IpLimiter>,
    register: Arc<IpLimiter>,
}

impl RateLimitConfig {
    pub fn new(quotas: &RateLimitQuotas) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(Quota::per_minute(
                NonZeroU32::new(quotas.login_per_minute.max(1)).unwrap(),
            ))),
            register: Arc::new(RateLimiter::keyed(Quota::per_minute(
                NonZeroU32::new(quotas.register_per_minute.max(1)).unwrap(),
            ))),
        }
    }
}

/// Limiter key for a request: first X-Forwarded-For hop, then the peer
/// address. Requests with neither share one bucket.
fn client_key(request: &Request) -> String {
    if let Some(forwarded_for) = request.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded_for.to_str() {
            if let Some(first_ip) = value.split(',').next() {
                let ip = first_ip.trim();
                if !ip.is_empty() {
                    return ip.to_string();
                }
            }
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match config.login.check_key(&client_key(&request)) {
        Ok(_) => next.run(request).await,
        Err(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many login attempts. Please wait before trying again.",
        )
            .into_response(),
    }
}

/// Middleware for rate limiting user registration.
pub async fn rate_limit_register(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    match config.register.check_key(&client_key(&request)) {
        Ok(_) => next.run(request).await,
        Err(_) => (
            StatusCode::TOO_MANY_REQUESTS,
            "Too many signup attempts. Please wait before trying again.",
        )
            .into_response(),
    }
}
