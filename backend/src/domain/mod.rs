//! Domain primitives, aggregates and services.
//!
//! Purpose: define the strongly typed entities shared by the HTTP and
//! persistence layers, the pure algorithms behind route building and friend
//! discovery, and the services implementing the driving ports. Adapters live
//! outside this module and talk to it only through `ports`.
//!
//! Public surface:
//! - Error / ErrorCode: API error payload and stable identifier.
//! - UserProfile / Username / UserId: account identity.
//! - Route / RouteName / TransportMode / Difficulty: the shared route record.
//! - RouteBuilder: geocode, graph and path pipeline.
//! - AccountService / RouteService / WeatherService: driving port adapters.

pub mod accounts;
pub mod auth;
pub mod auto_routes;
pub mod error;
pub mod friends;
pub mod geo;
pub mod ports;
pub mod route;
pub mod route_builder;
pub mod route_filter;
pub mod routes_service;
pub mod street_graph;
pub mod trace_id;
pub mod user;
pub mod weather;

pub use self::accounts::AccountService;
pub use self::auth::{LoginCredentials, LoginValidationError, PASSWORD_MAX_BYTES, PasswordHash};
pub use self::auto_routes::{AutoRouteError, AutoRoutePlanner, DEFAULT_AUTO_ROUTE_MAX};
pub use self::error::{Error, ErrorCode, ErrorValidationError, TRACE_ID_HEADER};
pub use self::friends::{FriendSummary, UserRoutes, common_routes, discover_friends};
pub use self::geo::{Coordinate, CoordinateError, ServiceArea, haversine_m};
pub use self::route::{
    Difficulty, ModeFilter, Route, RouteLeg, RouteName, RouteRequest, RouteValidationError,
    TransportMode, leg_duration_label,
};
pub use self::route_builder::{
    NETWORK_RADIUS_M, PlannedRoute, PointRole, RouteBuildError, RouteBuilder, RoutePoint,
};
pub use self::route_filter::{RouteFilter, RouteFilterError};
pub use self::routes_service::RouteService;
pub use self::street_graph::{
    GraphPath, NetworkNode, NetworkWay, StreetGraph, StreetGraphError, StreetNetwork,
};
pub use self::trace_id::TraceId;
pub use self::user::{
    EmailAddress, NewUser, NewUserParts, ProfileUpdate, ProfileUpdateParts, UserId, UserProfile,
    UserRecord, UserValidationError, Username,
};
pub use self::weather::{StubWeatherSource, WeatherReport, WeatherService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use routeshare::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
