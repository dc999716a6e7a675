//! Argon2 password and client-secret verification

use argon2::password_hash::{PasswordHash, PasswordVerifier};
use argon2::Argon2;
use log::{error, warn};

/// Check `raw` against a PHC-formatted argon2 hash.
///
/// A malformed stored hash never verifies.
pub fn verify_password(raw: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is malformed: {}", e);
            return false;
        }
    };
    Argon2::default()
        .verify_password(raw.as_bytes(), &parsed)
        .is_ok()
}

/// [`verify_password`] on the blocking pool, for use from async handlers
pub async fn verify_password_blocking(raw: &str, hash: &str) -> bool {
    let raw = raw.to_string();
    let hash = hash.to_string();
    match tokio::task::spawn_blocking(move || verify_password(&raw, &hash)).await {
        Ok(verified) => verified,
        Err(e) => {
            error!("Password verification task failed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{rand_core::OsRng, PasswordHasher, SaltString};

    fn hash_password(raw: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_verify_matching_password() {
        let hash = hash_password("correct");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        assert_ne!(hash_password("correct"), hash_password("correct"));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("correct", "correct"));
        assert!(!verify_password("", ""));
    }

    #[tokio::test]
    async fn test_blocking_verification() {
        let hash = crate::test_utils::test_hash("secret");
        assert!(verify_password_blocking("secret", &hash).await);
        assert!(!verify_password_blocking("wrong", &hash).await);
        assert!(!verify_password_blocking("secret", "not-a-hash").await);
    }
}
