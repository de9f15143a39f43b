//! One-shot import of the legacy `users.json` document.
//!
//! Each legacy entry is validated like a registration, its plaintext password
//! hashed, and any listed route names that already exist are linked to the
//! new account. Usernames already present are skipped untouched.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use mockable::Clock;
use serde::Deserialize;
use tracing::{info, warn};

use crate::domain::ports::{
    PasswordHashError, PasswordHasher, RoutePersistenceError, RouteRepository,
    UserPersistenceError, UserRepository, hash_blocking,
};
use crate::domain::{NewUser, NewUserParts, RouteName, UserId, UserRecord, Username};

/// Legacy account entry; field names follow the exported document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LegacyUser {
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "telefono")]
    pub phone: Option<String>,
    #[serde(rename = "fecha_nacimiento")]
    pub birth_date: Option<String>,
    #[serde(rename = "ciudad")]
    pub city: Option<String>,
    pub password: String,
    #[serde(rename = "fecha_registro")]
    pub registered_at: Option<String>,
    #[serde(rename = "rutas")]
    pub routes: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LegacyImportError {
    #[error("legacy document is not a JSON list of users: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Users(#[from] UserPersistenceError),
    #[error(transparent)]
    Routes(#[from] RoutePersistenceError),
    #[error("password hashing failed: {0}")]
    Hash(#[from] PasswordHashError),
}

/// Outcome counters for one import run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: Vec<Username>,
    pub existing: Vec<String>,
    /// Entries that failed validation, with the offending field.
    pub rejected: Vec<(String, String)>,
    pub linked_routes: usize,
    pub missing_routes: Vec<String>,
}

/// Parse the legacy document.
///
/// # Errors
///
/// Returns [`LegacyImportError::Parse`] for anything other than a JSON array of
/// user objects.
pub fn parse_legacy_users(bytes: &[u8]) -> Result<Vec<LegacyUser>, LegacyImportError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Legacy dates were written either as `YYYY-MM-DD` or as a full ISO
/// timestamp; only the calendar date is kept.
fn birth_date_part(raw: Option<&str>) -> Option<&str> {
    let raw = raw?.trim();
    let date = raw.split_once('T').map_or(raw, |(date, _)| date);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok().map(|_| date)
}

fn registration_time(raw: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim) else {
        return fallback;
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|at| at.and_utc()))
        .unwrap_or(fallback)
}

/// Copies legacy accounts into the user and route repositories.
pub struct LegacyImporter<U: ?Sized, R: ?Sized, H: ?Sized> {
    users: Arc<U>,
    routes: Arc<R>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<U, R, H> LegacyImporter<U, R, H>
where
    U: UserRepository + ?Sized,
    R: RouteRepository + ?Sized,
    H: PasswordHasher + ?Sized + 'static,
{
    pub fn new(users: Arc<U>, routes: Arc<R>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            routes,
            hasher,
            clock,
        }
    }

    /// Import every entry, continuing past invalid ones.
    ///
    /// # Errors
    ///
    /// Stops at the first repository or hashing failure.
    pub async fn import(&self, legacy: Vec<LegacyUser>) -> Result<ImportReport, LegacyImportError> {
        let mut report = ImportReport::default();
        for entry in legacy {
            let new_user = match NewUser::try_from_parts(NewUserParts {
                first_name: &entry.first_name,
                last_name: &entry.last_name,
                email: &entry.email,
                username: &entry.username,
                password: &entry.password,
                phone: entry.phone.as_deref().filter(|v| !v.trim().is_empty()),
                birth_date: birth_date_part(entry.birth_date.as_deref()),
                city: entry.city.as_deref().filter(|v| !v.trim().is_empty()),
            }) {
                Ok(user) => user,
                Err(error) => {
                    warn!(username = %entry.username, field = error.field(), "legacy user rejected");
                    report
                        .rejected
                        .push((entry.username.clone(), error.field().to_owned()));
                    continue;
                }
            };

            if self.users.find_by_username(&new_user.username).await?.is_some() {
                info!(username = %new_user.username, "legacy user already present");
                report.existing.push(new_user.username.to_string());
                continue;
            }

            let password_hash = hash_blocking(&self.hasher, new_user.password()).await?;
            let registered_at = registration_time(entry.registered_at.as_deref(), self.clock.utc());
            let id = UserId::random();
            let profile = new_user.into_profile(id, registered_at);
            let username = profile.username.clone();
            match self
                .users
                .insert(&UserRecord {
                    profile,
                    password_hash,
                })
                .await
            {
                Ok(()) => {}
                Err(UserPersistenceError::Duplicate { field }) => {
                    warn!(%username, %field, "legacy user clashes with a stored account");
                    report.rejected.push((username.to_string(), field));
                    continue;
                }
                Err(error) => return Err(error.into()),
            }

            for raw in &entry.routes {
                let linked = match RouteName::new(raw) {
                    Ok(name) if self.routes.find(&name).await?.is_some() => {
                        self.routes.link(&id, &name).await?;
                        true
                    }
                    _ => false,
                };
                if linked {
                    report.linked_routes += 1;
                } else {
                    report.missing_routes.push(raw.clone());
                }
            }
            report.imported.push(username);
        }
        info!(
            imported = report.imported.len(),
            existing = report.existing.len(),
            rejected = report.rejected.len(),
            linked_routes = report.linked_routes,
            "legacy import finished"
        );
        Ok(report)
    }
}
