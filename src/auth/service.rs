//! Token lifecycle: login, re-issuance, and revocation.
//!
//! Every credential or token failure surfaces to callers as a plain
//! `None`. The cause (expired, revoked, malformed, not found) is tracked
//! internally and logged, but never leaks into the result type, so
//! callers cannot branch on it.

use crate::db::{Database, Session};
use crate::jwt::{JwtConfig, JwtError, KeyPurpose, Verification};

use super::password::verify_password;

/// The token pair issued on login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Why a login or re-issuance was denied. Logging-only; callers observe a
/// uniform `None`.
#[derive(Debug)]
enum DenyReason {
    UnknownEmail,
    BadPassword,
    ExpiredToken,
    InvalidToken,
    MissingSessionClaim,
    SessionNotFound,
    SessionRevoked,
}

fn denied<T>(reason: DenyReason) -> Option<T> {
    tracing::debug!(reason = ?reason, "authentication denied");
    None
}

/// Infrastructure failures during token lifecycle operations. These are
/// real errors (database, signing), distinct from denial.
#[derive(Debug)]
pub enum AuthError {
    Db(sqlx::Error),
    Token(JwtError),
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::Db(e) => write!(f, "Database error: {}", e),
            AuthError::Token(e) => write!(f, "Token error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Db(e)
    }
}

impl From<JwtError> for AuthError {
    fn from(e: JwtError) -> Self {
        AuthError::Token(e)
    }
}

/// Orchestrates sessions and tokens over the database and the codec.
pub struct AuthService<'a> {
    db: &'a Database,
    jwt: &'a JwtConfig,
}

impl<'a> AuthService<'a> {
    pub fn new(db: &'a Database, jwt: &'a JwtConfig) -> Self {
        Self { db, jwt }
    }

    /// Log a user in: verify the password, create a fresh session, and
    /// sign an access/refresh token pair bound to it. Every login creates
    /// a new session, so one user may hold several concurrently valid
    /// sessions, each independently revocable.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        user_agent: &str,
    ) -> Result<Option<TokenPair>, AuthError> {
        let Some(creds) = self.db.users().credentials_by_email(email).await? else {
            return Ok(denied(DenyReason::UnknownEmail));
        };

        if !verify_password(password, &creds.password_hash) {
            return Ok(denied(DenyReason::BadPassword));
        }

        let session = self.db.sessions().create(&creds.user.uuid, user_agent).await?;

        let access_token = self
            .jwt
            .sign(&creds.user, &session.uuid, KeyPurpose::Access, None)?;
        let refresh_token = self
            .jwt
            .sign(&creds.user, &session.uuid, KeyPurpose::Refresh, None)?;

        tracing::info!(user = %creds.user.uuid, session = %session.uuid, "user logged in");

        Ok(Some(TokenPair {
            access_token,
            refresh_token,
        }))
    }

    /// Exchange a refresh token for a fresh access token. Honored only if
    /// the token verifies, the session it references is still valid, and
    /// the owning user still exists. The refresh token itself is never
    /// rotated or invalidated here; it stays usable until its own expiry
    /// or until the session is revoked.
    pub async fn reissue_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<String>, AuthError> {
        let claims = match self.jwt.verify(refresh_token, KeyPurpose::Refresh) {
            Verification::Valid(claims) => claims,
            Verification::Expired => return Ok(denied(DenyReason::ExpiredToken)),
            Verification::Invalid => return Ok(denied(DenyReason::InvalidToken)),
        };

        let Some(session_uuid) = claims.session else {
            return Ok(denied(DenyReason::MissingSessionClaim));
        };

        let Some(session) = self.db.sessions().get_by_uuid(&session_uuid).await? else {
            return Ok(denied(DenyReason::SessionNotFound));
        };

        if !session.valid {
            return Ok(denied(DenyReason::SessionRevoked));
        }

        let Some(user) = self.db.users().get_by_uuid(&session.user_uuid).await? else {
            // A valid session pointing at a missing user is a data
            // inconsistency, not a client mistake. Denied all the same.
            tracing::warn!(
                session = %session.uuid,
                user = %session.user_uuid,
                "session references a missing user"
            );
            return Ok(None);
        };

        let access_token = self
            .jwt
            .sign(&user, &session.uuid, KeyPurpose::Access, None)?;

        Ok(Some(access_token))
    }

    /// Revoke a session. Refresh tokens bound to it are dead from this
    /// point on, even though their signatures and expiry remain valid.
    /// Access tokens already in the wild stay honorable until their own
    /// short expiry; there is no access-token blacklist. Idempotent.
    pub async fn revoke_session(&self, session_uuid: &str) -> Result<(), AuthError> {
        self.db.sessions().set_validity(session_uuid, false).await?;
        tracing::info!(session = %session_uuid, "session revoked");
        Ok(())
    }

    /// List a user's currently valid sessions.
    pub async fn list_active_sessions(
        &self,
        user_uuid: &str,
    ) -> Result<Vec<Session>, AuthError> {
        Ok(self.db.sessions().list_valid_by_user(user_uuid).await?)
    }
}
