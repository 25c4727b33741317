mod common;

use axum::http::StatusCode;
use common::*;

#[tokio::test]
async fn test_register_success() {
    let (app, _db) = test_app().await;

    let body = register_user(&app, "test@example.com", "Test User", "Asdf123$").await;

    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["name"], "Test User");
    assert!(body["id"].as_str().is_some());
    assert!(body["createdAt"].as_str().is_some());
    // The password hash must never leave the server.
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_rejects_weak_passwords() {
    let (app, _db) = test_app().await;

    for password in [
        "short1$",          // too short
        "Asdf123$Asdf123$x", // too long
        "asdf123$",          // no uppercase
        "ASDF123$",          // no lowercase
        "Asdfghj$",          // no digit
        "Asdf1234",          // no special character
    ] {
        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/users",
                serde_json::json!({
                    "name": "Test User",
                    "email": "test@example.com",
                    "password": password,
                    "passwordConfirmation": password,
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "password {:?}", password);
    }
}

#[tokio::test]
async fn test_register_rejects_mismatched_confirmation() {
    let (app, _db) = test_app().await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            serde_json::json!({
                "name": "Test User",
                "email": "test@example.com",
                "password": "Asdf123$",
                "passwordConfirmation": "Asdf123!",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let (app, _db) = test_app().await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            serde_json::json!({
                "name": "Test User",
                "email": "not-an-email",
                "password": "Asdf123$",
                "passwordConfirmation": "Asdf123$",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_duplicate_email_conflict() {
    let (app, _db) = test_app().await;

    register_user(&app, "test@example.com", "Test User", "Asdf123$").await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            serde_json::json!({
                "name": "Other User",
                "email": "test@example.com",
                "password": "Asdf123$",
                "passwordConfirmation": "Asdf123$",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Case-insensitive duplicate is a conflict too.
    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/users",
            serde_json::json!({
                "name": "Other User",
                "email": "TEST@example.com",
                "password": "Asdf123$",
                "passwordConfirmation": "Asdf123$",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_current_user_returns_claims_identity() {
    let (app, _db) = test_app().await;

    register_user(&app, "test@example.com", "Test User", "Asdf123$").await;
    let (access, _refresh) = login(&app, "test@example.com", "Asdf123$").await;

    let (status, body) = send(&app, authed_request("GET", "/api/users/me", &access)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["name"], "Test User");
    assert!(body["id"].as_str().is_some());
    assert!(body["session"].as_str().is_some());
}

#[tokio::test]
async fn test_current_user_requires_auth() {
    let (app, _db) = test_app().await;

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/api/users/me")
        .body(axum::body::Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
