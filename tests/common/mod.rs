#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode},
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tradepost::jwt::{
    ACCESS_TOKEN_TTL_SECS, JwtConfig, KeyMaterial, REFRESH_TOKEN_TTL_SECS,
};
use tradepost::rate_limit::RateLimitQuotas;
use tradepost::{ServerConfig, create_app, db::Database};

pub const ACCESS_PRIVATE_PEM: &str = include_str!("../fixtures/access_private.pem");
pub const ACCESS_PUBLIC_PEM: &str = include_str!("../fixtures/access_public.pem");
pub const REFRESH_PRIVATE_PEM: &str = include_str!("../fixtures/refresh_private.pem");
pub const REFRESH_PUBLIC_PEM: &str = include_str!("../fixtures/refresh_public.pem");

pub fn key_material() -> KeyMaterial {
    KeyMaterial {
        access_private_pem: ACCESS_PRIVATE_PEM.as_bytes().to_vec(),
        access_public_pem: ACCESS_PUBLIC_PEM.as_bytes().to_vec(),
        refresh_private_pem: REFRESH_PRIVATE_PEM.as_bytes().to_vec(),
        refresh_public_pem: REFRESH_PUBLIC_PEM.as_bytes().to_vec(),
    }
}

pub fn jwt_config() -> JwtConfig {
    JwtConfig::new(
        &key_material(),
        Duration::from_secs(ACCESS_TOKEN_TTL_SECS),
        Duration::from_secs(REFRESH_TOKEN_TTL_SECS),
    )
    .expect("Failed to build test JwtConfig")
}

pub async fn test_app() -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt: Arc::new(jwt_config()),
        rate_limits: RateLimitQuotas::relaxed(),
    };
    (create_app(&config), db)
}

/// Build a JSON request.
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Send a request and return the full response.
pub async fn send_raw(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Send a request and return status plus parsed JSON body (Null when the
/// body is empty or not JSON).
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = send_raw(app, request).await;
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// Register a user through the API and return the response body.
pub async fn register_user(
    app: &Router,
    email: &str,
    name: &str,
    password: &str,
) -> serde_json::Value {
    let (status, body) = send(
        app,
        json_request(
            "POST",
            "/api/users",
            serde_json::json!({
                "name": name,
                "email": email,
                "password": password,
                "passwordConfirmation": password,
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "registration failed: {}", body);
    body
}

/// Log in through the API and return the (access, refresh) token pair.
pub async fn login(app: &Router, email: &str, password: &str) -> (String, String) {
    login_with_agent(app, email, password, "TestAgent/1.0").await
}

/// Log in with an explicit User-Agent header.
pub async fn login_with_agent(
    app: &Router,
    email: &str,
    password: &str,
    user_agent: &str,
) -> (String, String) {
    let request = Request::builder()
        .method("POST")
        .uri("/api/sessions")
        .header("content-type", "application/json")
        .header("user-agent", user_agent)
        .body(Body::from(
            serde_json::json!({ "email": email, "password": password }).to_string(),
        ))
        .unwrap();

    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::CREATED, "login failed: {}", body);

    let access = body["accessToken"].as_str().unwrap().to_string();
    let refresh = body["refreshToken"].as_str().unwrap().to_string();
    (access, refresh)
}

/// Build an authenticated request with an empty body.
pub fn authed_request(method: &str, uri: &str, access_token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", access_token))
        .body(Body::empty())
        .unwrap()
}

/// Build an authenticated JSON request.
pub fn authed_json_request(
    method: &str,
    uri: &str,
    access_token: &str,
    body: serde_json::Value,
) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", access_token))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}
