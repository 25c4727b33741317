//! JWT token generation and validation.
//!
//! Tokens are signed with RS256 so that verification only ever needs the
//! public half of a key pair. Access and refresh tokens use separate key
//! pairs; [`KeyPurpose`] selects which pair an operation applies to.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::db::User;

/// Access token duration: 15 minutes
pub const ACCESS_TOKEN_TTL_SECS: u64 = 15 * 60;

/// Refresh token duration: 1 year
pub const REFRESH_TOKEN_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Selects which key pair a sign/verify operation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPurpose {
    /// Short-lived access tokens.
    Access,
    /// Long-lived refresh tokens, honored only while the referenced
    /// session is still valid.
    Refresh,
}

/// Claims carried by both access and refresh tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user UUID)
    pub sub: String,
    /// User email
    pub email: String,
    /// Display name
    pub name: String,
    /// UUID of the session this token is bound to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
}

/// Outcome of verifying a token. Verification never fails with an error:
/// every failure mode collapses into [`Verification::Expired`] or
/// [`Verification::Invalid`]. Signature mismatch and structural corruption
/// are indistinguishable to callers; only expiry is reported separately,
/// because it is the only case with differentiated handling (silent
/// re-issuance).
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Signature and expiry check out; the decoded claims are returned.
    Valid(TokenClaims),
    /// Well-formed and correctly signed, but past its expiry.
    Expired,
    /// Malformed, tampered with, or signed with the wrong key.
    Invalid,
}

/// PEM-encoded key material for both token purposes, already decoded from
/// the base64 transport form the process configuration supplies.
pub struct KeyMaterial {
    pub access_private_pem: Vec<u8>,
    pub access_public_pem: Vec<u8>,
    pub refresh_private_pem: Vec<u8>,
    pub refresh_public_pem: Vec<u8>,
}

/// Configuration for JWT operations. Built once at startup from explicit
/// key material; bad keys fail construction, so a running server can
/// always sign and verify.
pub struct JwtConfig {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtConfig {
    /// Create a new JWT configuration from PEM key material and the TTLs
    /// for each token purpose.
    pub fn new(
        keys: &KeyMaterial,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Result<Self, JwtError> {
        Ok(Self {
            access_encoding: EncodingKey::from_rsa_pem(&keys.access_private_pem)
                .map_err(JwtError::InvalidKey)?,
            access_decoding: DecodingKey::from_rsa_pem(&keys.access_public_pem)
                .map_err(JwtError::InvalidKey)?,
            refresh_encoding: EncodingKey::from_rsa_pem(&keys.refresh_private_pem)
                .map_err(JwtError::InvalidKey)?,
            refresh_decoding: DecodingKey::from_rsa_pem(&keys.refresh_public_pem)
                .map_err(JwtError::InvalidKey)?,
            access_ttl,
            refresh_ttl,
        })
    }

    /// Sign a token for the given purpose, embedding the user snapshot and
    /// the owning session's UUID. `ttl` overrides the configured duration
    /// for the purpose.
    pub fn sign(
        &self,
        user: &User,
        session_uuid: &str,
        purpose: KeyPurpose,
        ttl: Option<Duration>,
    ) -> Result<String, JwtError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| JwtError::TimeError)?
            .as_secs();

        let ttl = ttl.unwrap_or(match purpose {
            KeyPurpose::Access => self.access_ttl,
            KeyPurpose::Refresh => self.refresh_ttl,
        });

        let claims = TokenClaims {
            sub: user.uuid.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            session: Some(session_uuid.to_string()),
            iat: now,
            exp: now + ttl.as_secs(),
        };

        let key = match purpose {
            KeyPurpose::Access => &self.access_encoding,
            KeyPurpose::Refresh => &self.refresh_encoding,
        };

        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, key)
            .map_err(JwtError::Encoding)
    }

    /// Verify and decode a token against the public key for the given
    /// purpose. All failures are normalized into the three-way
    /// [`Verification`] outcome; this never returns an error.
    pub fn verify(&self, token: &str, purpose: KeyPurpose) -> Verification {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.leeway = 0;

        let key = match purpose {
            KeyPurpose::Access => &self.access_decoding,
            KeyPurpose::Refresh => &self.refresh_decoding,
        };

        match jsonwebtoken::decode::<TokenClaims>(token, key, &validation) {
            Ok(data) => Verification::Valid(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::ExpiredSignature) => Verification::Expired,
            Err(e) => {
                tracing::debug!(error = %e, "token verification failed");
                Verification::Invalid
            }
        }
    }
}

/// Errors that can occur constructing the codec or signing tokens.
/// Verification never errors; see [`Verification`].
#[derive(Debug)]
pub enum JwtError {
    /// Key material could not be parsed as an RSA PEM key
    InvalidKey(jsonwebtoken::errors::Error),
    /// Error encoding the token
    Encoding(jsonwebtoken::errors::Error),
    /// System time error
    TimeError,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::InvalidKey(e) => write!(f, "Invalid key material: {}", e),
            JwtError::Encoding(e) => write!(f, "Failed to encode token: {}", e),
            JwtError::TimeError => write!(f, "System time error"),
        }
    }
}

impl std::error::Error for JwtError {}


#[cfg(test)]
mod tests {
    use super::test_keys::*;
    use super::*;

    fn test_user() -> User {
        User {
            id: 1,
            uuid: "uuid-123".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_sign_and_verify_access_token() {
        let config = jwt_config();

        let token = config
            .sign(&test_user(), "session-1", KeyPurpose::Access, None)
            .unwrap();

        let Verification::Valid(claims) = config.verify(&token, KeyPurpose::Access) else {
            panic!("expected valid token");
        };
        assert_eq!(claims.sub, "uuid-123");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.session.as_deref(), Some("session-1"));
        assert_eq!(claims.exp - claims.iat, ACCESS_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_sign_and_verify_refresh_token() {
        let config = jwt_config();

        let token = config
            .sign(&test_user(), "session-1", KeyPurpose::Refresh, None)
            .unwrap();

        let Verification::Valid(claims) = config.verify(&token, KeyPurpose::Refresh) else {
            panic!("expected valid token");
        };
        assert_eq!(claims.session.as_deref(), Some("session-1"));
        assert_eq!(claims.exp - claims.iat, REFRESH_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_wrong_purpose_rejected() {
        let config = jwt_config();

        let access = config
            .sign(&test_user(), "session-1", KeyPurpose::Access, None)
            .unwrap();
        let refresh = config
            .sign(&test_user(), "session-1", KeyPurpose::Refresh, None)
            .unwrap();

        // The key pairs differ, so a token never verifies under the other purpose.
        assert_eq!(config.verify(&access, KeyPurpose::Refresh), Verification::Invalid);
        assert_eq!(config.verify(&refresh, KeyPurpose::Access), Verification::Invalid);
    }

    #[test]
    fn test_ttl_override() {
        let config = jwt_config();

        let token = config
            .sign(
                &test_user(),
                "session-1",
                KeyPurpose::Access,
                Some(Duration::from_secs(60)),
            )
            .unwrap();

        let Verification::Valid(claims) = config.verify(&token, KeyPurpose::Access) else {
            panic!("expected valid token");
        };
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_malformed_token_invalid() {
        let config = jwt_config();
        assert_eq!(
            config.verify("not-a-token", KeyPurpose::Access),
            Verification::Invalid
        );
        assert_eq!(config.verify("", KeyPurpose::Access), Verification::Invalid);
    }

    #[test]
    fn test_tampered_token_invalid() {
        let config = jwt_config();

        let token = config
            .sign(&test_user(), "session-1", KeyPurpose::Access, None)
            .unwrap();

        // Corrupt the signature segment.
        let mut tampered = token[..token.len() - 4].to_string();
        tampered.push_str("AAAA");

        assert_eq!(
            config.verify(&tampered, KeyPurpose::Access),
            Verification::Invalid
        );
    }

    #[test]
    fn test_expired_token() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Encode claims with exp in the past, bypassing sign().
        let claims = TokenClaims {
            sub: "uuid-123".to_string(),
            email: "alice@example.com".to_string(),
            name: "Alice".to_string(),
            session: Some("session-1".to_string()),
            iat: now - 100,
            exp: now - 50,
        };

        let encoding_key = EncodingKey::from_rsa_pem(ACCESS_PRIVATE_PEM.as_bytes()).unwrap();
        let token =
            jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &encoding_key).unwrap();

        let config = jwt_config();
        assert_eq!(config.verify(&token, KeyPurpose::Access), Verification::Expired);
    }

    #[test]
    fn test_bad_key_material_rejected() {
        let mut keys = key_material();
        keys.access_private_pem = b"not a pem".to_vec();

        let result = JwtConfig::new(
            &keys,
            Duration::from_secs(ACCESS_TOKEN_TTL_SECS),
            Duration::from_secs(REFRESH_TOKEN_TTL_SECS),
        );
        assert!(matches!(result, Err(JwtError::InvalidKey(_))));
    }
}
