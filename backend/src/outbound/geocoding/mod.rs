//! Geocoding outbound adapters.
//!
//! `NominatimGeocoder` performs the HTTP lookups; `RateLimitedGeocoder`
//! serialises calls behind a minimum interval and retries transient failures
//! according to a `GeocodeRetryPolicy`.

mod dto;
mod nominatim;
mod rate_limited;
mod retry;

pub use nominatim::{NominatimGeocoder, NominatimIdentity};
pub use rate_limited::RateLimitedGeocoder;
pub use retry::{AttemptJitter, BackoffJitter, GeocodeRetryPolicy, GeocodeSleeper, TokioSleeper};
