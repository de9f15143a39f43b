//! User data model.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use zeroize::Zeroizing;

use super::auth::{LoginValidationError, PasswordHash, validate_password};

/// Minimum allowed username length.
pub const USERNAME_MIN: usize = 3;
/// Maximum allowed username length.
pub const USERNAME_MAX: usize = 32;
/// Maximum length for free-text profile fields (names, phone, city).
pub const PROFILE_FIELD_MAX: usize = 100;

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    #[error("user id must be a valid UUID")]
    InvalidId,
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("username must be between {min} and {max} characters")]
    UsernameLength { min: usize, max: usize },
    #[error("username may only contain letters, numbers, underscores, dots or hyphens")]
    UsernameInvalidCharacters,
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("email must look like local@domain")]
    InvalidEmail,
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    #[error("{field} must be at most {max} characters")]
    FieldTooLong { field: &'static str, max: usize },
    #[error("birthDate must be a YYYY-MM-DD date")]
    InvalidBirthDate,
    #[error(transparent)]
    Password(#[from] LoginValidationError),
}

impl UserValidationError {
    /// JSON field name the error refers to, used for `details.field`.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidId => "id",
            Self::EmptyUsername | Self::UsernameLength { .. } | Self::UsernameInvalidCharacters => {
                "username"
            }
            Self::EmptyEmail | Self::InvalidEmail => "email",
            Self::EmptyField { field } | Self::FieldTooLong { field, .. } => field,
            Self::InvalidBirthDate => "birthDate",
            Self::Password(_) => "password",
        }
    }
}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Parse a [`UserId`] from its hyphenated string form.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID, typically loaded from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Unique login handle.
///
/// # Examples
/// ```
/// use routeshare::domain::Username;
///
/// let name = Username::new("  ana.g ").unwrap();
/// assert_eq!(name.as_ref(), "ana.g");
/// assert!(Username::new("a b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Validate and construct a [`Username`]; surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        let length = trimmed.chars().count();
        if !(USERNAME_MIN..=USERNAME_MAX).contains(&length) {
            return Err(UserValidationError::UsernameLength {
                min: USERNAME_MIN,
                max: USERNAME_MAX,
            });
        }
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-');
        if !trimmed.chars().all(allowed) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Normalised (trimmed, lower-cased) email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        let mut parts = normalised.split('@');
        let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || normalised.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidEmail);
        }
        if normalised.chars().count() > PROFILE_FIELD_MAX {
            return Err(UserValidationError::FieldTooLong {
                field: "email",
                max: PROFILE_FIELD_MAX,
            });
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

fn required_text(field: &'static str, raw: &str) -> Result<String, UserValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(UserValidationError::EmptyField { field });
    }
    optional_text(field, Some(raw)).map(|value| value.unwrap_or_default())
}

fn optional_text(field: &'static str, raw: Option<&str>) -> Result<Option<String>, UserValidationError> {
    let Some(trimmed) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > PROFILE_FIELD_MAX {
        return Err(UserValidationError::FieldTooLong {
            field,
            max: PROFILE_FIELD_MAX,
        });
    }
    Ok(Some(trimmed.to_owned()))
}

fn optional_birth_date(raw: Option<&str>) -> Result<Option<NaiveDate>, UserValidationError> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| UserValidationError::InvalidBirthDate),
    }
}

/// Public view of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    #[schema(value_type = String, example = "ana_g")]
    pub username: Username,
    #[schema(example = "Ana")]
    pub first_name: String,
    #[schema(example = "García")]
    pub last_name: String,
    #[schema(value_type = String, example = "ana@example.com")]
    pub email: EmailAddress,
    pub phone: Option<String>,
    #[schema(value_type = Option<String>, example = "1990-04-12")]
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub registered_at: DateTime<Utc>,
}

/// Stored user: profile plus credential hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub profile: UserProfile,
    pub password_hash: PasswordHash,
}

/// Raw registration fields as received by an inbound adapter.
#[derive(Debug, Clone, Default)]
pub struct NewUserParts<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub username: &'a str,
    pub password: &'a str,
    pub phone: Option<&'a str>,
    pub birth_date: Option<&'a str>,
    pub city: Option<&'a str>,
}

/// Validated registration payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: Username,
    pub first_name: String,
    pub last_name: String,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    password: Zeroizing<String>,
}

impl NewUser {
    /// Validate every registration field.
    pub fn try_from_parts(parts: NewUserParts<'_>) -> Result<Self, UserValidationError> {
        let username = Username::new(parts.username)?;
        let first_name = required_text("firstName", parts.first_name)?;
        let last_name = required_text("lastName", parts.last_name)?;
        let email = EmailAddress::new(parts.email)?;
        validate_password(parts.password)?;

        Ok(Self {
            username,
            first_name,
            last_name,
            email,
            phone: optional_text("phone", parts.phone)?,
            birth_date: optional_birth_date(parts.birth_date)?,
            city: optional_text("city", parts.city)?,
            password: Zeroizing::new(parts.password.to_owned()),
        })
    }

    /// Plaintext password to be hashed before storage.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Build the stored profile once an id and timestamp are assigned.
    pub fn into_profile(self, id: UserId, registered_at: DateTime<Utc>) -> UserProfile {
        UserProfile {
            id,
            username: self.username,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            birth_date: self.birth_date,
            city: self.city,
            registered_at,
        }
    }
}

/// Raw profile-edit fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdateParts<'a> {
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub birth_date: Option<&'a str>,
    pub city: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// Validated partial profile update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    password: Option<Zeroizing<String>>,
}

impl ProfileUpdate {
    /// Validate the fields that are present.
    pub fn try_from_parts(parts: ProfileUpdateParts<'_>) -> Result<Self, UserValidationError> {
        let password = match parts.password {
            Some(raw) => {
                validate_password(raw)?;
                Some(Zeroizing::new(raw.to_owned()))
            }
            None => None,
        };
        Ok(Self {
            first_name: parts
                .first_name
                .map(|raw| required_text("firstName", raw))
                .transpose()?,
            last_name: parts
                .last_name
                .map(|raw| required_text("lastName", raw))
                .transpose()?,
            email: parts.email.map(EmailAddress::new).transpose()?,
            phone: optional_text("phone", parts.phone)?,
            birth_date: optional_birth_date(parts.birth_date)?,
            city: optional_text("city", parts.city)?,
            password,
        })
    }

    /// Replacement password, if one was supplied.
    pub fn password(&self) -> Option<&str> {
        self.password.as_ref().map(|value| value.as_str())
    }

    /// Overwrite the present fields on `profile`.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(value) = &self.first_name {
            profile.first_name.clone_from(value);
        }
        if let Some(value) = &self.last_name {
            profile.last_name.clone_from(value);
        }
        if let Some(value) = &self.email {
            profile.email = value.clone();
        }
        if self.phone.is_some() {
            profile.phone.clone_from(&self.phone);
        }
        if self.birth_date.is_some() {
            profile.birth_date = self.birth_date;
        }
        if self.city.is_some() {
            profile.city.clone_from(&self.city);
        }
    }
}
