//! Driving port for user-facing profile queries.

use async_trait::async_trait;

use crate::domain::{Error, UserId, UserProfile};

/// Domain use-case port for reading profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// Profile of the user behind a session.
    async fn profile(&self, id: &UserId) -> Result<UserProfile, Error>;

    /// Profiles whose username contains `fragment`, case-insensitively.
    async fn search(&self, fragment: &str) -> Result<Vec<UserProfile>, Error>;
}
