//! Axum extractors for authentication.
//!
//! Protected handlers take [`Auth`]; anonymous-allowed routes simply do
//! not mount an extractor. A request with no establishable identity is
//! rejected, never passed through anonymously.

use std::cell::RefCell;

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::service::AuthService;
use super::state::HasAuthBackend;
use crate::jwt::{KeyPurpose, TokenClaims, Verification};

/// Request header carrying the refresh token for silent re-issuance.
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh";

/// Response header carrying a freshly re-issued access token for the
/// client to adopt.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

tokio::task_local! {
    /// Task-local slot for an access token re-issued while authenticating
    /// the current request. Written by the extractor, drained by
    /// [`propagate_reissued_token`].
    static REISSUED_ACCESS_TOKEN: RefCell<Option<String>>;
}

/// Middleware that surfaces a re-issued access token to the client via
/// the `x-access-token` response header. Must wrap every router that uses
/// the [`Auth`] extractor.
pub async fn propagate_reissued_token(request: Request, next: Next) -> Response {
    REISSUED_ACCESS_TOKEN
        .scope(RefCell::new(None), async move {
            let mut response = next.run(request).await;
            let token = REISSUED_ACCESS_TOKEN.with(|cell| cell.borrow_mut().take());
            if let Some(token) = token {
                if let Ok(value) = HeaderValue::from_str(&token) {
                    response.headers_mut().insert(ACCESS_TOKEN_HEADER, value);
                }
            }
            response
        })
        .await
}

/// Identity resolved for the current request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Claims from the access token (original or silently re-issued).
    pub claims: TokenClaims,
}

/// Extract the bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Core authentication logic: verify the access token, and on expiry
/// attempt silent re-issuance through the refresh token in `x-refresh`.
async fn authenticate_request<S>(
    parts: &Parts,
    state: &S,
) -> Result<AuthenticatedUser, AuthErrorKind>
where
    S: HasAuthBackend + Send + Sync,
{
    let access_token = bearer_token(&parts.headers).ok_or(AuthErrorKind::NotAuthenticated)?;

    match state.jwt().verify(access_token, KeyPurpose::Access) {
        Verification::Valid(claims) => return Ok(AuthenticatedUser { claims }),
        Verification::Expired => {}
        Verification::Invalid => return Err(AuthErrorKind::InvalidToken),
    }

    // Access token expired - try the refresh token.
    let refresh_token = parts
        .headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthErrorKind::NotAuthenticated)?;

    let reissued = AuthService::new(state.db(), state.jwt())
        .reissue_access_token(refresh_token)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to reissue access token");
            AuthErrorKind::ServiceError
        })?
        .ok_or(AuthErrorKind::RefreshDenied)?;

    // Decode the fresh token to get the claims we hand downstream.
    let Verification::Valid(claims) = state.jwt().verify(&reissued, KeyPurpose::Access) else {
        return Err(AuthErrorKind::ServiceError);
    };

    // Stash the new token for the response middleware.
    let _ = REISSUED_ACCESS_TOKEN.try_with(|cell| {
        cell.borrow_mut().replace(reissued);
    });

    Ok(AuthenticatedUser { claims })
}

/// Extractor for endpoints that require authentication. Validates the
/// bearer access token; if expired, attempts silent re-issuance via the
/// `x-refresh` header. Rejects with 401 when no identity can be
/// established.
pub struct Auth(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for Auth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate_request(parts, state)
            .await
            .map(Auth)
            .map_err(ApiAuthError::new)
    }
}
