//! Password hashing with Argon2id
//!
//! Registered users never keep their raw password. [`CredentialHasher::hash`]
//! salts each password with a fresh random salt and returns a PHC string
//! (`$argon2id$v=19$m=...`); [`CredentialHasher::verify`] reads the parameters
//! back out of that string, so hashes made with one cost still verify after the
//! configured cost changes.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::account::AuthError;

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashingConfig {
    /// Minimal cost, for tests only
    pub fn fast() -> Self {
        Self { memory_kib: 64, iterations: 1, parallelism: 1 }
    }

    /// Set the memory cost in KiB
    pub fn memory_kib(mut self, kib: u32) -> Self {
        self.memory_kib = kib;
        self
    }

    /// Set the number of passes
    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }
}

/// Hashes and verifies user passwords
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    /// Build a hasher from cost parameters
    pub fn new(config: HashingConfig) -> Result<Self, AuthError> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        Ok(Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) })
    }

    /// Hash a password, returning a PHC-format string
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a password against a stored PHC string
    ///
    /// A malformed stored hash never matches.
    pub fn verify(&self, password: &str, stored: &str) -> bool {
        match PasswordHash::new(stored) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Unreadable password hash: {}", e);
                false
            }
        }
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(HashingConfig::fast()).unwrap()
    }

    #[test]
    fn test_hash_is_phc_and_salted() {
        let hasher = hasher();
        let first = hasher.hash("secret1").unwrap();
        let second = hasher.hash("secret1").unwrap();

        assert!(first.starts_with("$argon2id$"));
        assert_ne!(first, second);
        assert!(!first.contains("secret1"));
    }

    #[test]
    fn test_verify() {
        let hasher = hasher();
        let hash = hasher.hash("secret1").unwrap();

        assert!(hasher.verify("secret1", &hash));
        assert!(!hasher.verify("Secret1", &hash));
        assert!(!hasher.verify("secret", &hash));
    }

    #[test]
    fn test_verify_across_costs() {
        let hash = hasher().hash("secret1").unwrap();
        let stronger =
            CredentialHasher::new(HashingConfig::fast().memory_kib(128).iterations(2)).unwrap();

        assert!(stronger.verify("secret1", &hash));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!hasher().verify("secret1", "secret1"));
    }

    #[test]
    fn test_invalid_params_rejected() {
        let result = CredentialHasher::new(HashingConfig::fast().iterations(0));
        assert!(matches!(result, Err(AuthError::Hashing(_))));
    }
}
