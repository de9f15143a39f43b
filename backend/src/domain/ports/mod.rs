//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (repositories, geocoder, street network, weather provider,
//! artifact store, password hasher) come with in-memory fixtures so the
//! server can run without external services. Driving ports are implemented
//! by the domain services and consumed by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod account_command;
mod geocoder;
mod login_service;
mod password_hasher;
mod route_artifact_store;
mod route_command;
mod route_query;
mod route_repository;
mod street_network_source;
mod user_repository;
mod users_query;
mod weather_source;

#[cfg(test)]
pub use account_command::MockAccountCommand;
pub use account_command::AccountCommand;
#[cfg(test)]
pub use geocoder::MockGeocoder;
pub use geocoder::{FixtureGeocoder, GeocodeError, Geocoder};
#[cfg(test)]
pub use login_service::MockLoginService;
pub use login_service::LoginService;
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{
    FixturePasswordHasher, PasswordHashError, PasswordHasher, hash_blocking, verify_blocking,
};
#[cfg(test)]
pub use route_artifact_store::MockRouteArtifactStore;
pub use route_artifact_store::{
    ArtifactKind, ArtifactStoreError, ExportReport, FixtureArtifactStore, RouteArtifactStore,
    parse_artifact_file_name,
};
#[cfg(test)]
pub use route_command::MockRouteCommand;
pub use route_command::{AutoRouteRequest, CreatedRoute, RouteCommand};
#[cfg(test)]
pub use route_query::MockRouteQuery;
pub use route_query::RouteQuery;
#[cfg(test)]
pub use route_repository::MockRouteRepository;
pub use route_repository::{FixtureRouteRepository, RoutePersistenceError, RouteRepository};
#[cfg(test)]
pub use street_network_source::MockStreetNetworkSource;
pub use street_network_source::{
    FixtureStreetNetworkSource, StreetNetworkError, StreetNetworkSource,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserPersistenceError, UserRepository};
#[cfg(test)]
pub use users_query::MockUsersQuery;
pub use users_query::UsersQuery;
#[cfg(test)]
pub use weather_source::{MockWeatherQuery, MockWeatherSource};
pub use weather_source::{WeatherQuery, WeatherSource, WeatherSourceError};
