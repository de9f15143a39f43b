//! Port for turning free-text addresses into coordinates.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::Coordinate;

use super::define_port_error;

define_port_error! {
    /// Errors raised by geocoding adapters.
    pub enum GeocodeError {
        /// The provider found nothing for the address.
        NotFound { address: String } => "no geocoding result for `{address}`",
        /// The request did not complete in time.
        Timeout { message: String } => "geocoding request timed out: {message}",
        /// The provider answered with a non-success status.
        Status { status: u16, message: String } => "geocoder returned HTTP {status}: {message}",
        /// The request could not be sent or the connection failed.
        Transport { message: String } => "geocoding transport failed: {message}",
        /// The provider answered with an unexpected body.
        Decode { message: String } => "geocoder response could not be decoded: {message}",
    }
}

impl GeocodeError {
    /// Whether retrying the same request may succeed (timeouts, 429, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::NotFound { .. } | Self::Transport { .. } | Self::Decode { .. } => false,
        }
    }
}

/// Port resolving a single address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError>;
}

/// Lookup-table geocoder keyed by lower-cased, trimmed address.
#[derive(Debug, Default, Clone)]
pub struct FixtureGeocoder {
    known: HashMap<String, Coordinate>,
}

impl FixtureGeocoder {
    pub fn new(entries: impl IntoIterator<Item = (impl AsRef<str>, Coordinate)>) -> Self {
        Self {
            known: entries
                .into_iter()
                .map(|(address, coord)| (normalise(address.as_ref()), coord))
                .collect(),
        }
    }

    /// Landmarks around Alicante used by the in-memory server wiring.
    pub fn alicante() -> Self {
        let landmarks = [
            ("Plaza de los Luceros, Alicante", 38.3452, -0.4905),
            ("Castillo de Santa Bárbara, Alicante", 38.3490, -0.4780),
            ("Explanada de España, Alicante", 38.3425, -0.4830),
            ("Playa del Postiguet, Alicante", 38.3460, -0.4760),
            ("Mercado Central, Alicante", 38.3470, -0.4880),
        ];
        Self::new(landmarks.into_iter().filter_map(|(name, lat, lon)| {
            Coordinate::new(lat, lon).ok().map(|coord| (name, coord))
        }))
    }
}

fn normalise(address: &str) -> String {
    address.trim().to_lowercase()
}

#[async_trait]
impl Geocoder for FixtureGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        self.known
            .get(&normalise(address))
            .copied()
            .ok_or_else(|| GeocodeError::not_found(address))
    }
}
