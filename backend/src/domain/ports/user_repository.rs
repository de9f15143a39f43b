//! Port abstraction for user persistence adapters and their errors.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{UserId, UserProfile, UserRecord, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique column (username or email) already holds the value.
        Duplicate { field: String } => "a user with this {field} already exists",
    }
}

/// Port for reading and writing registered users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; fails with `Duplicate` on username/email clashes.
    async fn insert(&self, record: &UserRecord) -> Result<(), UserPersistenceError>;

    /// Overwrite profile fields and password hash of an existing user.
    async fn update(&self, record: &UserRecord) -> Result<(), UserPersistenceError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, UserPersistenceError>;

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, UserPersistenceError>;

    /// Profiles whose username contains `fragment`, case-insensitively,
    /// ordered by username.
    async fn search(&self, fragment: &str) -> Result<Vec<UserProfile>, UserPersistenceError>;

    /// Every profile, ordered by username.
    async fn list(&self) -> Result<Vec<UserProfile>, UserPersistenceError>;

    /// Remove a user; returns whether a row existed.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;
}

/// In-memory repository used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct FixtureUserRepository {
    users: Mutex<Vec<UserRecord>>,
}

impl FixtureUserRepository {
    fn with_users<T>(
        &self,
        f: impl FnOnce(&mut Vec<UserRecord>) -> Result<T, UserPersistenceError>,
    ) -> Result<T, UserPersistenceError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| UserPersistenceError::connection("fixture user store poisoned"))?;
        f(&mut users)
    }
}

fn check_unique(
    users: &[UserRecord],
    record: &UserRecord,
) -> Result<(), UserPersistenceError> {
    let others = users.iter().filter(|u| u.profile.id != record.profile.id);
    for other in others {
        if other.profile.username == record.profile.username {
            return Err(UserPersistenceError::duplicate("username"));
        }
        if other.profile.email == record.profile.email {
            return Err(UserPersistenceError::duplicate("email"));
        }
    }
    Ok(())
}

fn sorted_profiles<'a>(records: impl Iterator<Item = &'a UserRecord>) -> Vec<UserProfile> {
    let mut profiles: Vec<UserProfile> = records.map(|r| r.profile.clone()).collect();
    profiles.sort_by(|a, b| a.username.cmp(&b.username));
    profiles
}

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn insert(&self, record: &UserRecord) -> Result<(), UserPersistenceError> {
        self.with_users(|users| {
            check_unique(users, record)?;
            users.push(record.clone());
            Ok(())
        })
    }

    async fn update(&self, record: &UserRecord) -> Result<(), UserPersistenceError> {
        self.with_users(|users| {
            check_unique(users, record)?;
            let slot = users
                .iter_mut()
                .find(|u| u.profile.id == record.profile.id)
                .ok_or_else(|| UserPersistenceError::query("user not found"))?;
            *slot = record.clone();
            Ok(())
        })
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserRecord>, UserPersistenceError> {
        self.with_users(|users| Ok(users.iter().find(|u| u.profile.id == *id).cloned()))
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<UserRecord>, UserPersistenceError> {
        self.with_users(|users| {
            Ok(users
                .iter()
                .find(|u| u.profile.username == *username)
                .cloned())
        })
    }

    async fn search(&self, fragment: &str) -> Result<Vec<UserProfile>, UserPersistenceError> {
        let needle = fragment.to_lowercase();
        self.with_users(|users| {
            Ok(sorted_profiles(users.iter().filter(|u| {
                u.profile.username.as_ref().to_lowercase().contains(&needle)
            })))
        })
    }

    async fn list(&self) -> Result<Vec<UserProfile>, UserPersistenceError> {
        self.with_users(|users| Ok(sorted_profiles(users.iter())))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        self.with_users(|users| {
            let before = users.len();
            users.retain(|u| u.profile.id != *id);
            Ok(users.len() != before)
        })
    }
}
