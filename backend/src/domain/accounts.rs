//! Account use-cases: registration, login, profile edits and deletion.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use super::ports::{
    AccountCommand, LoginService, PasswordHashError, PasswordHasher, RouteArtifactStore,
    RoutePersistenceError, RouteRepository, UserPersistenceError, UserRepository, UsersQuery,
    hash_blocking, verify_blocking,
};
use super::{
    Error, LoginCredentials, NewUser, ProfileUpdate, UserId, UserProfile, UserRecord, Username,
};

pub(crate) fn map_user_persistence_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            warn!(%message, "user repository unavailable");
            Error::service_unavailable("user repository unavailable")
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::Duplicate { field } => {
            Error::conflict(format!("a user with this {field} already exists"))
                .with_details(json!({ "field": field, "code": "duplicate" }))
        }
    }
}

pub(crate) fn map_route_persistence_error(error: RoutePersistenceError) -> Error {
    match error {
        RoutePersistenceError::Connection { message } => {
            warn!(%message, "route repository unavailable");
            Error::service_unavailable("route repository unavailable")
        }
        RoutePersistenceError::Query { message } => {
            Error::internal(format!("route repository error: {message}"))
        }
        RoutePersistenceError::Duplicate { name } => {
            Error::conflict(format!("route `{name}` already exists"))
                .with_details(json!({ "field": "name", "code": "duplicate" }))
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    Error::internal(error.to_string())
}

fn invalid_credentials() -> Error {
    Error::unauthorized("invalid credentials")
}

/// Implements the account driving ports over the repositories and hasher.
pub struct AccountService<U: ?Sized, R: ?Sized, A: ?Sized, H: ?Sized> {
    users: Arc<U>,
    routes: Arc<R>,
    artifacts: Arc<A>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
}

impl<U, R, A, H> AccountService<U, R, A, H>
where
    U: UserRepository + ?Sized,
    R: RouteRepository + ?Sized,
    A: RouteArtifactStore + ?Sized,
    H: PasswordHasher + ?Sized + 'static,
{
    pub fn new(
        users: Arc<U>,
        routes: Arc<R>,
        artifacts: Arc<A>,
        hasher: Arc<H>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            routes,
            artifacts,
            hasher,
            clock,
        }
    }

    async fn load(&self, id: &UserId) -> Result<UserRecord, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(|| Error::unauthorized("session user no longer exists"))
    }

    /// Unlink every route of `id`, removing routes left without owners.
    async fn release_routes(&self, id: &UserId) -> Result<(), Error> {
        let owned = self
            .routes
            .list_for_user(id)
            .await
            .map_err(map_route_persistence_error)?;
        for route in owned {
            self.routes
                .unlink(id, &route.name)
                .await
                .map_err(map_route_persistence_error)?;
            let remaining = self
                .routes
                .owner_count(&route.name)
                .await
                .map_err(map_route_persistence_error)?;
            if remaining == 0 {
                self.routes
                    .delete(&route.name)
                    .await
                    .map_err(map_route_persistence_error)?;
                if let Err(err) = self.artifacts.remove(&route.name).await {
                    warn!(route = %route.name, error = %err, "failed to remove route artifacts");
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<U, R, A, H> LoginService for AccountService<U, R, A, H>
where
    U: UserRepository + ?Sized,
    R: RouteRepository + ?Sized,
    A: RouteArtifactStore + ?Sized,
    H: PasswordHasher + ?Sized + 'static,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserProfile, Error> {
        let Ok(username) = Username::new(credentials.username()) else {
            return Err(invalid_credentials());
        };
        let record = self
            .users
            .find_by_username(&username)
            .await
            .map_err(map_user_persistence_error)?
            .ok_or_else(invalid_credentials)?;
        let verified = verify_blocking(&self.hasher, credentials.password(), &record.password_hash)
            .await
            .map_err(map_hash_error)?;
        if !verified {
            return Err(invalid_credentials());
        }
        info!(user = %record.profile.username, "user logged in");
        Ok(record.profile)
    }
}

#[async_trait]
impl<U, R, A, H> AccountCommand for AccountService<U, R, A, H>
where
    U: UserRepository + ?Sized,
    R: RouteRepository + ?Sized,
    A: RouteArtifactStore + ?Sized,
    H: PasswordHasher + ?Sized + 'static,
{
    async fn register(&self, user: NewUser) -> Result<UserProfile, Error> {
        let password_hash = hash_blocking(&self.hasher, user.password())
            .await
            .map_err(map_hash_error)?;
        let profile = user.into_profile(UserId::random(), self.clock.utc());
        let record = UserRecord {
            profile,
            password_hash,
        };
        self.users
            .insert(&record)
            .await
            .map_err(map_user_persistence_error)?;
        info!(user = %record.profile.username, "user registered");
        Ok(record.profile)
    }

    async fn update_profile(
        &self,
        actor: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserProfile, Error> {
        let mut record = self.load(actor).await?;
        update.apply_to(&mut record.profile);
        if let Some(password) = update.password() {
            record.password_hash = hash_blocking(&self.hasher, password)
                .await
                .map_err(map_hash_error)?;
        }
        self.users
            .update(&record)
            .await
            .map_err(map_user_persistence_error)?;
        Ok(record.profile)
    }

    async fn delete_account(&self, actor: &UserId, target: &Username) -> Result<(), Error> {
        let record = self.load(actor).await?;
        if record.profile.username != *target {
            return Err(Error::forbidden("users may only delete their own account"));
        }
        self.release_routes(actor).await?;
        self.users
            .delete(actor)
            .await
            .map_err(map_user_persistence_error)?;
        info!(user = %target, "user deleted");
        Ok(())
    }
}

#[async_trait]
impl<U, R, A, H> UsersQuery for AccountService<U, R, A, H>
where
    U: UserRepository + ?Sized,
    R: RouteRepository + ?Sized,
    A: RouteArtifactStore + ?Sized,
    H: PasswordHasher + ?Sized + 'static,
{
    async fn profile(&self, id: &UserId) -> Result<UserProfile, Error> {
        Ok(self.load(id).await?.profile)
    }

    async fn search(&self, fragment: &str) -> Result<Vec<UserProfile>, Error> {
        self.users
            .search(fragment.trim())
            .await
            .map_err(map_user_persistence_error)
    }
}

#[cfg(test)]
mod tests;
