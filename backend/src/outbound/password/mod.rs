//! Argon2id password hashing adapter.

use argon2::password_hash::{self, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;

use crate::domain::PasswordHash;
use crate::domain::ports::{PasswordHashError, PasswordHasher};

/// Hashes passwords into Argon2id PHC strings (`$argon2id$v=19$...`).
#[derive(Debug, Clone)]
pub struct Argon2PasswordHasher {
    params: Params,
}

impl Default for Argon2PasswordHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl Argon2PasswordHasher {
    /// Use explicit cost parameters; verification honours whatever
    /// parameters are encoded in the stored hash.
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        let mut salt_bytes = [0_u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|error| PasswordHashError::hash(error.to_string()))?;
        let phc = self
            .argon2()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|error| PasswordHashError::hash(error.to_string()))?;
        Ok(PasswordHash::new(phc.to_string()))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError> {
        let parsed = password_hash::PasswordHash::new(hash.as_str())
            .map_err(|error| PasswordHashError::malformed(error.to_string()))?;
        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(error) => Err(PasswordHashError::hash(error.to_string())),
        }
    }
}
