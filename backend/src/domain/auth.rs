//! Authentication primitives: login credentials and stored password hashes.
//!
//! Inbound adapters build [`LoginCredentials`] from raw payloads; the account
//! service compares them against a [`PasswordHash`] through the
//! `PasswordHasher` port so no plaintext password is ever persisted.

use std::fmt;

use zeroize::Zeroizing;

/// Upper bound on accepted password length, in bytes.
pub const PASSWORD_MAX_BYTES: usize = 128;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    #[error("username must not be empty")]
    EmptyUsername,
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password exceeded [`PASSWORD_MAX_BYTES`].
    #[error("password must be at most {max} bytes")]
    PasswordTooLong { max: usize },
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use routeshare::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" ana ", "s3cret").unwrap();
/// assert_eq!(creds.username(), "ana");
/// assert_eq!(creds.password(), "s3cret");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }
        validate_password(password)?;

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Username string suitable for user lookups.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Shared password shape check for login and registration.
pub(crate) fn validate_password(password: &str) -> Result<(), LoginValidationError> {
    if password.is_empty() {
        return Err(LoginValidationError::EmptyPassword);
    }
    if password.len() > PASSWORD_MAX_BYTES {
        return Err(LoginValidationError::PasswordTooLong {
            max: PASSWORD_MAX_BYTES,
        });
    }
    Ok(())
}

/// Opaque PHC-format password hash as stored alongside a user.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap an encoded hash produced by a `PasswordHasher`.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded PHC string.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}
