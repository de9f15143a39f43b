//! Driving port for login/authentication use-cases.
//!
//! Inbound adapters call it to authenticate credentials without importing the
//! backing repository or password hasher.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, UserProfile};

/// Domain use-case port for authentication.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoginService: Send + Sync {
    /// Validate credentials and return the authenticated user's profile.
    ///
    /// Unknown usernames and wrong passwords fail identically with
    /// `unauthorized`.
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserProfile, Error>;
}
