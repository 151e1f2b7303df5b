use super::AuthError;

pub use bcrypt::DEFAULT_COST;

/// Hash a password with bcrypt at the given work factor
pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    bcrypt::hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a password against a stored bcrypt hash
pub fn verify_password(password: &str, stored: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, stored).map_err(|e| AuthError::Hashing(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4; // bcrypt's minimum cost (bcrypt::MIN_COST is private)

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("s3creto", TEST_COST).unwrap();
        assert!(hash.starts_with("$2b$"));
        assert!(verify_password("s3creto", &hash).unwrap());
        assert!(!verify_password("S3creto", &hash).unwrap());
    }

    #[test]
    fn same_password_gets_different_salts() {
        assert_ne!(
            hash_password("abcd", TEST_COST).unwrap(),
            hash_password("abcd", TEST_COST).unwrap()
        );
    }

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(verify_password("x", "plaintext").is_err());
        assert!(verify_password("x", "sha256$1$salt$abc").is_err());
    }

    #[test]
    fn cost_below_minimum_is_rejected() {
        assert!(matches!(hash_password("abcd", 1), Err(AuthError::Hashing(_))));
    }
}
