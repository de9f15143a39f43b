//! Driving port for account lifecycle commands.

use async_trait::async_trait;

use crate::domain::{Error, NewUser, ProfileUpdate, UserId, UserProfile, Username};

/// Domain use-case port for registering, editing and deleting accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountCommand: Send + Sync {
    /// Create an account; duplicate username or email yields `conflict`.
    async fn register(&self, user: NewUser) -> Result<UserProfile, Error>;

    /// Apply `update` to the actor's own profile.
    async fn update_profile(
        &self,
        actor: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, Error>;

    /// Delete `target`, which must be the actor's own account.
    async fn delete_account(&self, actor: &UserId, target: &Username) -> Result<(), Error>;
}
