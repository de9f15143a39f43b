//! Route use-cases: build and persist routes, delete memberships, queries
//! and friend discovery.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde_json::json;
use tracing::{info, warn};

use super::accounts::{map_route_persistence_error, map_user_persistence_error};
use super::auto_routes::{AutoRouteError, AutoRoutePlanner};
use super::friends::{FriendSummary, UserRoutes, common_routes, discover_friends};
use super::ports::{
    ArtifactKind, ArtifactStoreError, AutoRouteRequest, CreatedRoute, GeocodeError, Geocoder,
    RouteArtifactStore, RouteCommand, RouteQuery, RouteRepository, StreetNetworkError,
    StreetNetworkSource, UserRepository,
};
use super::route_builder::{PlannedRoute, RouteBuildError, RouteBuilder};
use super::{Error, Route, RouteFilter, RouteName, RouteRequest, UserId, UserProfile, Username};

fn map_build_error(error: RouteBuildError) -> Error {
    match error {
        RouteBuildError::Geocode { address, source } => match source {
            GeocodeError::NotFound { .. } => {
                Error::invalid_request(format!("address `{address}` could not be found"))
                    .with_details(json!({ "field": "address", "address": address, "code": "not_found" }))
            }
            GeocodeError::Decode { message } => {
                Error::internal(format!("geocoder response could not be decoded: {message}"))
            }
            other => {
                warn!(%address, error = %other, "geocoding failed");
                Error::service_unavailable("geocoding service unavailable")
            }
        },
        RouteBuildError::OutOfArea { address } => {
            Error::invalid_request(format!("address `{address}` is outside the service area"))
                .with_details(json!({ "field": "address", "address": address, "code": "out_of_area" }))
        }
        RouteBuildError::Network(StreetNetworkError::Decode { message }) => {
            Error::internal(format!("street network response could not be decoded: {message}"))
        }
        RouteBuildError::Network(other) => {
            warn!(error = %other, "street network fetch failed");
            Error::service_unavailable("street network service unavailable")
        }
        RouteBuildError::Graph(err) => Error::invalid_request(err.to_string()),
        RouteBuildError::NoPath { from, to } => {
            Error::invalid_request(format!("no path between `{from}` and `{to}`"))
                .with_details(json!({ "from": from, "to": to, "code": "no_path" }))
        }
    }
}

fn map_auto_error(error: AutoRouteError) -> Error {
    let field = match error {
        AutoRouteError::TooFewAddresses => "addresses",
        AutoRouteError::CountOutOfRange { .. } => "count",
    };
    Error::invalid_request(error.to_string()).with_details(json!({ "field": field }))
}

fn map_artifact_error(error: ArtifactStoreError) -> Error {
    match error {
        ArtifactStoreError::NotFound { name } => {
            Error::not_found(format!("artifact `{name}` not found"))
        }
        ArtifactStoreError::InvalidName { name } => {
            Error::invalid_request(format!("`{name}` is not a valid artifact name"))
        }
        other => Error::internal(other.to_string()),
    }
}

/// Implements the route driving ports.
pub struct RouteService<U: ?Sized, R: ?Sized, A: ?Sized, G: ?Sized, N: ?Sized> {
    users: Arc<U>,
    routes: Arc<R>,
    artifacts: Arc<A>,
    builder: RouteBuilder<G, N>,
    planner: AutoRoutePlanner,
    rng: Mutex<SmallRng>,
}

impl<U, R, A, G, N> RouteService<U, R, A, G, N>
where
    U: UserRepository + ?Sized,
    R: RouteRepository + ?Sized,
    A: RouteArtifactStore + ?Sized,
    G: Geocoder + ?Sized,
    N: StreetNetworkSource + ?Sized,
{
    pub fn new(
        users: Arc<U>,
        routes: Arc<R>,
        artifacts: Arc<A>,
        builder: RouteBuilder<G, N>,
        planner: AutoRoutePlanner,
    ) -> Self {
        Self {
            users,
            routes,
            artifacts,
            builder,
            planner,
            rng: Mutex::new(SmallRng::from_entropy()),
        }
    }

    /// Replace the sampling RNG with a seeded one for reproducible batches.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(SmallRng::seed_from_u64(seed));
        self
    }

    async fn owner_profile(&self, id: &UserId) -> Result<UserProfile, Error> {
        self.users
            .find_by_id(id)
            .await
            .map_err(map_user_persistence_error)?
            .map(|record| record.profile)
            .ok_or_else(|| Error::unauthorized("session user no longer exists"))
    }

    async fn profile_by_username(&self, username: &Username) -> Result<UserProfile, Error> {
        self.users
            .find_by_username(username)
            .await
            .map_err(map_user_persistence_error)?
            .map(|record| record.profile)
            .ok_or_else(|| Error::not_found(format!("user `{username}` not found")))
    }

    async fn ensure_name_free(&self, name: &RouteName) -> Result<(), Error> {
        let existing = self
            .routes
            .find(name)
            .await
            .map_err(map_route_persistence_error)?;
        match existing {
            Some(_) => Err(Error::conflict(format!("route `{name}` already exists"))
                .with_details(json!({ "field": "name", "code": "duplicate" }))),
            None => Ok(()),
        }
    }

    /// Persist, link and export one planned route.
    async fn persist(&self, owner: &UserId, planned: PlannedRoute) -> Result<CreatedRoute, Error> {
        self.routes
            .insert(&planned.route, owner)
            .await
            .map_err(map_route_persistence_error)?;
        let report = self.artifacts.export(&planned).await;
        for (kind, error) in &report.failed {
            warn!(route = %planned.route.name, %kind, %error, "artifact export failed");
        }
        info!(
            route = %planned.route.name,
            distance_km = planned.route.distance_km,
            artifacts = report.produced.len(),
            "route created"
        );
        Ok(CreatedRoute {
            route: planned.route,
            artifacts: report.produced,
        })
    }

    async fn user_routes(&self) -> Result<Vec<UserRoutes>, Error> {
        let profiles = self.users.list().await.map_err(map_user_persistence_error)?;
        let memberships = self
            .routes
            .memberships()
            .await
            .map_err(map_route_persistence_error)?;
        let mut by_user: HashMap<UserId, BTreeSet<RouteName>> = HashMap::new();
        for (user, route) in memberships {
            by_user.entry(user).or_default().insert(route);
        }
        Ok(profiles
            .into_iter()
            .map(|profile| UserRoutes {
                routes: by_user.remove(&profile.id).unwrap_or_default(),
                username: profile.username,
                first_name: profile.first_name,
                last_name: profile.last_name,
            })
            .collect())
    }
}

#[async_trait]
impl<U, R, A, G, N> RouteCommand for RouteService<U, R, A, G, N>
where
    U: UserRepository + ?Sized,
    R: RouteRepository + ?Sized,
    A: RouteArtifactStore + ?Sized,
    G: Geocoder + ?Sized,
    N: StreetNetworkSource + ?Sized,
{
    async fn create_manual(
        &self,
        owner: &UserId,
        request: RouteRequest,
    ) -> Result<CreatedRoute, Error> {
        let profile = self.owner_profile(owner).await?;
        let name = request
            .name
            .clone()
            .unwrap_or_else(|| RouteName::manual_default(self.builder.now()));
        self.ensure_name_free(&name).await?;
        let planned = self
            .builder
            .build(&request, name, Some(profile.username))
            .await
            .map_err(map_build_error)?;
        self.persist(owner, planned).await
    }

    async fn create_auto(
        &self,
        owner: &UserId,
        request: AutoRouteRequest,
    ) -> Result<Vec<CreatedRoute>, Error> {
        let profile = self.owner_profile(owner).await?;
        let samples = {
            let mut rng = self
                .rng
                .lock()
                .map_err(|_| Error::internal("route sampler lock poisoned"))?;
            self.planner
                .sample(&request.addresses, request.count, &mut *rng)
                .map_err(map_auto_error)?
        };

        let now = self.builder.now();
        let mut planned = Vec::with_capacity(samples.len());
        for (index, sample) in samples.iter().enumerate() {
            let name = RouteName::auto_default(index + 1, now);
            self.ensure_name_free(&name).await?;
            let route = self
                .builder
                .build(sample, name, Some(profile.username.clone()))
                .await
                .map_err(map_build_error)?;
            planned.push(route);
        }

        let mut created = Vec::with_capacity(planned.len());
        for route in planned {
            created.push(self.persist(owner, route).await?);
        }
        Ok(created)
    }

    async fn delete_for_user(
        &self,
        actor: &UserId,
        target: &Username,
        route: &RouteName,
    ) -> Result<(), Error> {
        let profile = self.owner_profile(actor).await?;
        if profile.username != *target {
            return Err(Error::forbidden("users may only delete their own routes"));
        }
        let unlinked = self
            .routes
            .unlink(actor, route)
            .await
            .map_err(map_route_persistence_error)?;
        if !unlinked {
            return Err(Error::not_found(format!(
                "route `{route}` is not linked to `{target}`"
            )));
        }
        let remaining = self
            .routes
            .owner_count(route)
            .await
            .map_err(map_route_persistence_error)?;
        if remaining == 0 {
            self.routes
                .delete(route)
                .await
                .map_err(map_route_persistence_error)?;
            if let Err(error) = self.artifacts.remove(route).await {
                warn!(%route, %error, "failed to remove route artifacts");
            }
            info!(%route, "route deleted");
        }
        Ok(())
    }
}

#[async_trait]
impl<U, R, A, G, N> RouteQuery for RouteService<U, R, A, G, N>
where
    U: UserRepository + ?Sized,
    R: RouteRepository + ?Sized,
    A: RouteArtifactStore + ?Sized,
    G: Geocoder + ?Sized,
    N: StreetNetworkSource + ?Sized,
{
    async fn list(&self) -> Result<Vec<Route>, Error> {
        self.routes.list().await.map_err(map_route_persistence_error)
    }

    async fn filter(&self, filter: RouteFilter) -> Result<Vec<Route>, Error> {
        Ok(filter.apply(self.list().await?))
    }

    async fn get(&self, name: &RouteName) -> Result<Route, Error> {
        self.routes
            .find(name)
            .await
            .map_err(map_route_persistence_error)?
            .ok_or_else(|| Error::not_found(format!("route `{name}` not found")))
    }

    async fn routes_of(&self, username: &Username) -> Result<Vec<Route>, Error> {
        let profile = self.profile_by_username(username).await?;
        self.routes
            .list_for_user(&profile.id)
            .await
            .map_err(map_route_persistence_error)
    }

    async fn friends(
        &self,
        username: &Username,
    ) -> Result<BTreeMap<Username, FriendSummary>, Error> {
        let everyone = self.user_routes().await?;
        let me = everyone
            .iter()
            .find(|u| u.username == *username)
            .ok_or_else(|| Error::not_found(format!("user `{username}` not found")))?;
        Ok(discover_friends(me, &everyone))
    }

    async fn common_routes(&self, a: &Username, b: &Username) -> Result<Vec<RouteName>, Error> {
        let everyone = self.user_routes().await?;
        let find = |name: &Username| {
            everyone
                .iter()
                .find(|u| u.username == *name)
                .ok_or_else(|| Error::not_found(format!("user `{name}` not found")))
        };
        Ok(common_routes(&find(a)?.routes, &find(b)?.routes))
    }

    async fn artifact(&self, name: &RouteName, kind: ArtifactKind) -> Result<Vec<u8>, Error> {
        self.get(name).await?;
        self.artifacts
            .read(name, kind)
            .await
            .map_err(map_artifact_error)
    }

    async fn static_file(&self, file_name: &str) -> Result<(ArtifactKind, Vec<u8>), Error> {
        self.artifacts
            .read_file(file_name)
            .await
            .map_err(map_artifact_error)
    }
}

#[cfg(test)]
mod tests;
