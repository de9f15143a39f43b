//! Port for route rows and the user-route membership join.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{Route, RouteName, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by route repository adapters.
    pub enum RoutePersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "route repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "route repository query failed: {message}",
        /// A route with the same name already exists.
        Duplicate { name: String } => "route `{name}` already exists",
    }
}

/// Port for persisting routes and linking them to users.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RouteRepository: Send + Sync {
    /// Insert `route` and link it to `owner` atomically.
    async fn insert(&self, route: &Route, owner: &UserId) -> Result<(), RoutePersistenceError>;

    async fn find(&self, name: &RouteName) -> Result<Option<Route>, RoutePersistenceError>;

    /// All routes, newest first.
    async fn list(&self) -> Result<Vec<Route>, RoutePersistenceError>;

    /// Routes linked to `user`, newest first.
    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Route>, RoutePersistenceError>;

    /// Link `user` to an existing route; linking twice is a no-op.
    async fn link(&self, user: &UserId, name: &RouteName) -> Result<(), RoutePersistenceError>;

    /// Remove a link; returns whether it existed.
    async fn unlink(&self, user: &UserId, name: &RouteName) -> Result<bool, RoutePersistenceError>;

    /// Number of users still linked to `name`.
    async fn owner_count(&self, name: &RouteName) -> Result<usize, RoutePersistenceError>;

    /// Delete the route row and any remaining links; returns whether it existed.
    async fn delete(&self, name: &RouteName) -> Result<bool, RoutePersistenceError>;

    /// Every `(user, route)` link.
    async fn memberships(&self) -> Result<Vec<(UserId, RouteName)>, RoutePersistenceError>;
}

#[derive(Debug, Default)]
struct FixtureRoutes {
    routes: BTreeMap<RouteName, Route>,
    links: Vec<(UserId, RouteName)>,
}

/// In-memory route repository.
#[derive(Debug, Default)]
pub struct FixtureRouteRepository {
    state: Mutex<FixtureRoutes>,
}

impl FixtureRouteRepository {
    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut FixtureRoutes) -> Result<T, RoutePersistenceError>,
    ) -> Result<T, RoutePersistenceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| RoutePersistenceError::connection("fixture route store poisoned"))?;
        f(&mut state)
    }
}

fn newest_first(mut routes: Vec<Route>) -> Vec<Route> {
    routes.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.name.cmp(&b.name)));
    routes
}

#[async_trait]
impl RouteRepository for FixtureRouteRepository {
    async fn insert(&self, route: &Route, owner: &UserId) -> Result<(), RoutePersistenceError> {
        self.with_state(|state| {
            if state.routes.contains_key(&route.name) {
                return Err(RoutePersistenceError::duplicate(route.name.as_ref()));
            }
            state.routes.insert(route.name.clone(), route.clone());
            state.links.push((*owner, route.name.clone()));
            Ok(())
        })
    }

    async fn find(&self, name: &RouteName) -> Result<Option<Route>, RoutePersistenceError> {
        self.with_state(|state| Ok(state.routes.get(name).cloned()))
    }

    async fn list(&self) -> Result<Vec<Route>, RoutePersistenceError> {
        self.with_state(|state| Ok(newest_first(state.routes.values().cloned().collect())))
    }

    async fn list_for_user(&self, user: &UserId) -> Result<Vec<Route>, RoutePersistenceError> {
        self.with_state(|state| {
            let routes = state
                .links
                .iter()
                .filter(|(owner, _)| owner == user)
                .filter_map(|(_, name)| state.routes.get(name).cloned())
                .collect();
            Ok(newest_first(routes))
        })
    }

    async fn link(&self, user: &UserId, name: &RouteName) -> Result<(), RoutePersistenceError> {
        self.with_state(|state| {
            if !state.routes.contains_key(name) {
                return Err(RoutePersistenceError::query(format!(
                    "route `{name}` does not exist"
                )));
            }
            let link = (*user, name.clone());
            if !state.links.contains(&link) {
                state.links.push(link);
            }
            Ok(())
        })
    }

    async fn unlink(&self, user: &UserId, name: &RouteName) -> Result<bool, RoutePersistenceError> {
        self.with_state(|state| {
            let before = state.links.len();
            state.links.retain(|(owner, route)| !(owner == user && route == name));
            Ok(state.links.len() != before)
        })
    }

    async fn owner_count(&self, name: &RouteName) -> Result<usize, RoutePersistenceError> {
        self.with_state(|state| Ok(state.links.iter().filter(|(_, route)| route == name).count()))
    }

    async fn delete(&self, name: &RouteName) -> Result<bool, RoutePersistenceError> {
        self.with_state(|state| {
            state.links.retain(|(_, route)| route != name);
            Ok(state.routes.remove(name).is_some())
        })
    }

    async fn memberships(&self) -> Result<Vec<(UserId, RouteName)>, RoutePersistenceError> {
        self.with_state(|state| Ok(state.links.clone()))
    }
}
