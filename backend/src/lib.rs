//! Route planning and sharing backend.
//!
//! Hexagonal layout: [`domain`] holds entities, services and ports;
//! [`inbound`] drives the domain over HTTP; [`outbound`] implements ports
//! against PostgreSQL, Nominatim, Overpass, OpenWeatherMap and the local
//! filesystem.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod legacy_import;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[doc(hidden)]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
