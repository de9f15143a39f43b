//! Port for one-way password hashing.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::PasswordHash;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashers.
    pub enum PasswordHashError {
        /// Hashing the password failed.
        Hash { message: String } => "password hashing failed: {message}",
        /// The stored hash could not be parsed.
        Malformed { message: String } => "stored password hash is malformed: {message}",
    }
}

/// Port hashing new passwords and verifying candidates against stored hashes.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError>;

    /// `Ok(false)` for a well-formed hash that does not match.
    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError>;
}

fn join_error(error: &tokio::task::JoinError) -> PasswordHashError {
    PasswordHashError::hash(format!("hashing task failed: {error}"))
}

/// Hash `password` on the blocking pool; key derivation is CPU bound.
///
/// # Errors
///
/// Propagates hasher failures and reports a panicked hashing task as
/// [`PasswordHashError::Hash`].
pub async fn hash_blocking<H>(hasher: &Arc<H>, password: &str) -> Result<PasswordHash, PasswordHashError>
where
    H: PasswordHasher + ?Sized + 'static,
{
    let hasher = Arc::clone(hasher);
    let password = Zeroizing::new(password.to_owned());
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|error| join_error(&error))?
}

/// Verify `password` against `hash` on the blocking pool.
///
/// # Errors
///
/// As [`hash_blocking`].
pub async fn verify_blocking<H>(
    hasher: &Arc<H>,
    password: &str,
    hash: &PasswordHash,
) -> Result<bool, PasswordHashError>
where
    H: PasswordHasher + ?Sized + 'static,
{
    let hasher = Arc::clone(hasher);
    let password = Zeroizing::new(password.to_owned());
    let hash = hash.clone();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|error| join_error(&error))?
}

/// Unsalted SHA-256 hasher for tests and the in-memory server wiring.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePasswordHasher;

const FIXTURE_PREFIX: &str = "sha256$";

impl PasswordHasher for FixturePasswordHasher {
    fn hash(&self, password: &str) -> Result<PasswordHash, PasswordHashError> {
        let digest = Sha256::digest(password.as_bytes());
        Ok(PasswordHash::new(format!(
            "{FIXTURE_PREFIX}{}",
            hex::encode(digest)
        )))
    }

    fn verify(&self, password: &str, hash: &PasswordHash) -> Result<bool, PasswordHashError> {
        if !hash.as_str().starts_with(FIXTURE_PREFIX) {
            return Err(PasswordHashError::malformed("missing sha256$ prefix"));
        }
        Ok(self.hash(password)?.as_str() == hash.as_str())
    }
}
