//! Password hashing utilities.

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::{ApiError, ApiResult};

/// Hash a password using bcrypt.
pub fn hash_password(password: &str) -> ApiResult<String> {
    hash(password, DEFAULT_COST).map_err(|e| ApiError::internal(format!("Hashing failed: {}", e)))
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hashed: &str) -> ApiResult<bool> {
    verify(password, hashed)
        .map_err(|e| ApiError::internal(format!("Hash verification failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hashed = hash_password("hunter42").unwrap();
        assert_ne!(hashed, "hunter42");
        assert!(verify_password("hunter42", &hashed).unwrap());
        assert!(!verify_password("wrong", &hashed).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }
}
