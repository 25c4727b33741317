//! Authentication error types.

use axum::response::{IntoResponse, Response};

/// Internal auth error kind used by the core authentication logic.
#[derive(Debug)]
pub enum AuthErrorKind {
    NotAuthenticated,
    InvalidToken,
    RefreshDenied,
    ServiceError,
}

/// Request authentication rejection. Returns JSON; the message never
/// distinguishes why a refresh was denied.
#[derive(Debug)]
pub struct ApiAuthError {
    pub(super) kind: AuthErrorKind,
}

impl ApiAuthError {
    pub(super) fn new(kind: AuthErrorKind) -> Self {
        Self { kind }
    }

    fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self.kind {
            AuthErrorKind::NotAuthenticated
            | AuthErrorKind::InvalidToken
            | AuthErrorKind::RefreshDenied => StatusCode::UNAUTHORIZED,
            AuthErrorKind::ServiceError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &'static str {
        match self.kind {
            AuthErrorKind::NotAuthenticated => "Not authenticated",
            AuthErrorKind::InvalidToken => "Invalid token",
            AuthErrorKind::RefreshDenied => "Could not refresh access token",
            AuthErrorKind::ServiceError => "Internal error",
        }
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        use axum::Json;
        use serde::Serialize;

        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
