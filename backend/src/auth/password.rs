//! Password hashing via bcrypt.

use crate::errors::{ServiceError, ServiceResult};
use bcrypt::{DEFAULT_COST, hash, verify};

/// Salted one-way password hasher.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Creates a hasher with the given bcrypt cost factor.
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Function to hash a password before storing in database
    ///
    /// Every call uses a fresh salt, so hashing the same password twice yields
    /// two different digests that both verify.
    ///
    /// # Errors
    /// Returns `ServiceError` if hashing fails (e.g. an out-of-range cost)
    pub fn hash_password(&self, password: &str) -> ServiceResult<String> {
        hash(password, self.cost)
            .map_err(|e| ServiceError::internal_error(format!("Password hashing failed: {}", e)))
    }

    /// Function to verify a password against the stored hash
    ///
    /// Comparison is exact: no trimming or case folding. A malformed digest
    /// verifies as `false`.
    pub fn verify_password(&self, password: &str, digest: &str) -> bool {
        match verify(password, digest) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::debug!("Password verification failed: {}", e);
                false
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimum bcrypt cost keeps the suite fast.
    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_then_verify() {
        let hasher = hasher();
        let digest = hasher.hash_password("MySecurePassword123!").unwrap();

        assert!(!digest.is_empty());
        assert_ne!(digest, "MySecurePassword123!");
        assert!(hasher.verify_password("MySecurePassword123!", &digest));
    }

    #[test]
    fn test_same_password_different_digests() {
        let hasher = hasher();
        let first = hasher.hash_password("TestPassword123!").unwrap();
        let second = hasher.hash_password("TestPassword123!").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify_password("TestPassword123!", &first));
        assert!(hasher.verify_password("TestPassword123!", &second));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let hasher = hasher();
        let digest = hasher.hash_password("MySecurePassword123!").unwrap();

        assert!(!hasher.verify_password("WrongPassword456!", &digest));
        assert!(!hasher.verify_password("", &digest));
    }

    #[test]
    fn test_case_and_whitespace_sensitive() {
        let hasher = hasher();
        let digest = hasher.hash_password("MyPassword").unwrap();

        assert!(!hasher.verify_password("mypassword", &digest));
        assert!(!hasher.verify_password("MyPassword ", &digest));
        assert!(!hasher.verify_password(" MyPassword", &digest));
    }

    #[test]
    fn test_unusual_inputs_roundtrip() {
        let hasher = hasher();
        for password in [
            "",
            "P@ssw0rd!#$%^&*()",
            "密码🔒Test123",
            "!@#$%^&*()_+-=[]{}|;:',.<>?/~`",
        ] {
            let digest = hasher.hash_password(password).unwrap();
            assert!(hasher.verify_password(password, &digest), "{password:?}");
        }
    }

    #[test]
    fn test_long_password_verifies() {
        let hasher = hasher();
        let long_password = "a".repeat(1000);
        let digest = hasher.hash_password(&long_password).unwrap();

        assert!(hasher.verify_password(&long_password, &digest));
    }

    #[test]
    fn test_malformed_digest_is_false() {
        let hasher = hasher();
        assert!(!hasher.verify_password("anything", "not-a-bcrypt-digest"));
        assert!(!hasher.verify_password("anything", ""));
    }

    #[test]
    fn test_invalid_cost_is_error() {
        assert!(PasswordHasher::new(99).hash_password("password").is_err());
    }
}
