//! Password hashing as an explicit service-layer step.
//!
//! Hashing happens here, before anything touches the database, so the
//! policy is testable without a storage engine in the loop.

use argon2::Argon2;
use argon2::password_hash::{
    PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
};

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Verify a candidate password against a stored hash. An unparsable hash
/// counts as a mismatch, never an error.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Asdf123$").unwrap();
        assert!(verify_password("Asdf123$", &hash));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hash = hash_password("Asdf123$").unwrap();
        assert!(!verify_password("Asdf123!", &hash));
    }

    #[test]
    fn test_garbage_hash_rejected() {
        assert!(!verify_password("Asdf123$", "not-a-hash"));
        assert!(!verify_password("Asdf123$", ""));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("Asdf123$").unwrap();
        let b = hash_password("Asdf123$").unwrap();
        assert_ne!(a, b);
    }
}
