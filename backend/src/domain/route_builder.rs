//! Route construction pipeline.
//!
//! Geocode every address, fetch the street network around the origin, snap
//! each point to its nearest graph node and chain shortest paths between
//! consecutive points. Any failure aborts the whole build.

use std::sync::Arc;

use mockable::Clock;
use tracing::{debug, instrument};

use super::geo::{Coordinate, ServiceArea};
use super::ports::{GeocodeError, Geocoder, StreetNetworkError, StreetNetworkSource};
use super::route::{Difficulty, Route, RouteLeg, RouteName, RouteRequest};
use super::street_graph::{StreetGraph, StreetGraphError};
use super::user::Username;

/// Radius of the street network fetched around the origin, in metres.
pub const NETWORK_RADIUS_M: u32 = 5_000;

/// Role of a point within a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointRole {
    Origin,
    Waypoint,
    Destination,
}

/// A geocoded route point.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePoint {
    pub address: String,
    pub coord: Coordinate,
    pub role: PointRole,
}

/// A computed route ready to persist and export.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    pub route: Route,
    pub legs: Vec<RouteLeg>,
    pub points: Vec<RoutePoint>,
}

/// Failures that abort a route build.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteBuildError {
    #[error("could not geocode `{address}`: {source}")]
    Geocode {
        address: String,
        #[source]
        source: GeocodeError,
    },
    #[error("`{address}` is outside the service area")]
    OutOfArea { address: String },
    #[error(transparent)]
    Network(#[from] StreetNetworkError),
    #[error(transparent)]
    Graph(#[from] StreetGraphError),
    #[error("no path between `{from}` and `{to}`")]
    NoPath { from: String, to: String },
}

/// Builds [`PlannedRoute`]s from address requests.
pub struct RouteBuilder<G: ?Sized, N: ?Sized> {
    geocoder: Arc<G>,
    network: Arc<N>,
    clock: Arc<dyn Clock>,
    area: ServiceArea,
}

impl<G, N> RouteBuilder<G, N>
where
    G: Geocoder + ?Sized,
    N: StreetNetworkSource + ?Sized,
{
    pub fn new(geocoder: Arc<G>, network: Arc<N>, clock: Arc<dyn Clock>, area: ServiceArea) -> Self {
        Self {
            geocoder,
            network,
            clock,
            area,
        }
    }

    /// Current time from the injected clock.
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.utc()
    }

    #[instrument(skip(self, request), fields(route = %name, mode = %request.mode))]
    pub async fn build(
        &self,
        request: &RouteRequest,
        name: RouteName,
        creator: Option<Username>,
    ) -> Result<PlannedRoute, RouteBuildError> {
        let points = self.geocode_all(request).await?;
        let origin = points
            .first()
            .map(|p| p.coord)
            .ok_or_else(|| RouteBuildError::OutOfArea {
                address: request.origin.clone(),
            })?;

        let network = self
            .network
            .fetch_around(origin, NETWORK_RADIUS_M, request.mode)
            .await?;
        let graph = StreetGraph::from_network(&network)?;
        debug!(nodes = graph.node_count(), "street graph ready");

        let speed = request.mode.average_speed_kmh();
        let mut legs = Vec::with_capacity(points.len().saturating_sub(1));
        for (index, pair) in points.windows(2).enumerate() {
            let [from, to] = pair else { continue };
            let no_path = || RouteBuildError::NoPath {
                from: from.address.clone(),
                to: to.address.clone(),
            };
            let a = graph.nearest_node(from.coord).ok_or_else(no_path)?;
            let b = graph.nearest_node(to.coord).ok_or_else(no_path)?;
            let path = graph.shortest_path(a, b).ok_or_else(no_path)?;
            legs.push(RouteLeg {
                index: index + 1,
                from: from.address.clone(),
                to: to.address.clone(),
                duration_hours: path.length_m / 1000.0 / speed,
                length_m: path.length_m,
                path: path.coordinates,
            });
        }

        let distance_km = legs.iter().map(|leg| leg.length_m).sum::<f64>() / 1000.0;
        let route = Route {
            name,
            origin: request.origin.clone(),
            waypoints: request.waypoints.clone(),
            destination: request.destination.clone(),
            mode: request.mode,
            distance_km,
            duration_hours: distance_km / speed,
            difficulty: Difficulty::from_distance_km(distance_km),
            created_at: self.clock.utc(),
            creator,
        };
        Ok(PlannedRoute {
            route,
            legs,
            points,
        })
    }

    async fn geocode_all(&self, request: &RouteRequest) -> Result<Vec<RoutePoint>, RouteBuildError> {
        let last = request.waypoints.len() + 1;
        let mut points = Vec::with_capacity(last + 1);
        for (position, address) in request.addresses().enumerate() {
            let coord = self.geocoder.geocode(address).await.map_err(|source| {
                RouteBuildError::Geocode {
                    address: address.to_owned(),
                    source,
                }
            })?;
            if !self.area.contains(&coord) {
                return Err(RouteBuildError::OutOfArea {
                    address: address.to_owned(),
                });
            }
            let role = match position {
                0 => PointRole::Origin,
                p if p == last => PointRole::Destination,
                _ => PointRole::Waypoint,
            };
            points.push(RoutePoint {
                address: address.to_owned(),
                coord,
                role,
            });
        }
        Ok(points)
    }
}
