// src/utils/hash.rs

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::AppError;

/// Hash a magic-link secret with Argon2 and a random salt.
pub fn hash_secret(secret: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .to_string();

    Ok(hash)
}

/// Check a secret against a stored hash. A mismatch is `Ok(false)`;
/// only an unparsable hash is an error.
pub fn verify_secret(secret: &str, secret_hash: &str) -> Result<bool, AppError> {
    let parsed_hash = PasswordHash::new(secret_hash)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_round_trip() {
        let hash = hash_secret("s3cret").unwrap();
        assert!(verify_secret("s3cret", &hash).unwrap());
        assert!(!verify_secret("other", &hash).unwrap());
    }

    #[test]
    fn test_garbage_hash_is_error() {
        assert!(verify_secret("s3cret", "not-a-hash").is_err());
    }
}
