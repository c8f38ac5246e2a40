use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;

/// Argon2 work factor. Fixed for the lifetime of a deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashCost {
    /// Memory in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashCost {
    /// Smallest cost argon2 accepts. Only meant for tests.
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

/// Salted argon2id hashing of user passwords.
///
/// Hashes are stored as PHC strings, so the salt and parameters travel with
/// the hash and verification works even if the configured cost changes.
#[derive(Clone, Debug)]
pub struct CredentialHasher {
    params: Params,
}

impl CredentialHasher {
    pub fn new(cost: HashCost) -> Result<Self, CryptoError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| CryptoError::InvalidCost(e.to_string()))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, CryptoError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CryptoError::Hash(e.to_string()))
    }

    /// Check a password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch and `Err` only when the stored hash
    /// cannot be parsed.
    pub fn verify(&self, password: &str, stored: &str) -> Result<bool, CryptoError> {
        let parsed =
            PasswordHash::new(stored).map_err(|e| CryptoError::MalformedHash(e.to_string()))?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CryptoError::MalformedHash(e.to_string())),
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(HashCost::minimal()).unwrap()
    }

    #[test]
    fn hash_and_verify() {
        let h = hasher();
        let stored = h.hash("hunter2").unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(h.verify("hunter2", &stored).unwrap());
    }

    #[test]
    fn wrong_password_is_false_not_error() {
        let h = hasher();
        let stored = h.hash("correct").unwrap();
        assert!(!h.verify("incorrect", &stored).unwrap());
    }

    #[test]
    fn salts_differ() {
        let h = hasher();
        assert_ne!(h.hash("same").unwrap(), h.hash("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_error() {
        let h = hasher();
        assert!(matches!(
            h.verify("pw", "not-a-phc-string"),
            Err(CryptoError::MalformedHash(_))
        ));
    }

    #[test]
    fn verify_uses_embedded_params() {
        let stored = hasher().hash("pw").unwrap();
        let other = CredentialHasher::new(HashCost {
            memory_kib: 64,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(other.verify("pw", &stored).unwrap());
    }

    #[test]
    fn zero_iterations_rejected() {
        let cost = HashCost {
            iterations: 0,
            ..HashCost::default()
        };
        assert!(matches!(
            CredentialHasher::new(cost),
            Err(CryptoError::InvalidCost(_))
        ));
    }
}
