//! Geographic primitives: coordinates, great-circle distance and the
//! service-area bounding box that geocoding results must fall inside.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Mean Earth radius used for haversine distances, in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Validation errors for [`Coordinate`].
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

/// WGS84 point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinate {
    #[schema(example = 38.3452)]
    lat: f64,
    #[schema(example = -0.4810)]
    lon: f64,
}

impl Coordinate {
    /// Validate latitude/longitude ranges.
    pub fn new(lat: f64, lon: f64) -> Result<Self, CoordinateError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(CoordinateError::Latitude(lat));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(CoordinateError::Longitude(lon));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Great-circle distance to `other` in metres.
    ///
    /// # Examples
    /// ```
    /// use routeshare::domain::Coordinate;
    ///
    /// let a = Coordinate::new(38.3452, -0.4810).unwrap();
    /// assert_eq!(a.distance_m(&a), 0.0);
    /// ```
    pub fn distance_m(&self, other: &Self) -> f64 {
        haversine_m(*self, *other)
    }
}

/// Haversine distance between two coordinates in metres.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Axis-aligned latitude/longitude box bounding accepted geocoding results.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceArea {
    lat: RangeInclusive<f64>,
    lon: RangeInclusive<f64>,
}

impl ServiceArea {
    pub fn new(lat: RangeInclusive<f64>, lon: RangeInclusive<f64>) -> Self {
        Self { lat, lon }
    }

    /// `(south, north, west, east)`.
    pub fn edges(&self) -> (f64, f64, f64, f64) {
        (
            *self.lat.start(),
            *self.lat.end(),
            *self.lon.start(),
            *self.lon.end(),
        )
    }

    /// Whether `coord` lies inside the box (edges included).
    pub fn contains(&self, coord: &Coordinate) -> bool {
        self.lat.contains(&coord.lat) && self.lon.contains(&coord.lon)
    }
}

impl Default for ServiceArea {
    /// Alicante metropolitan area.
    fn default() -> Self {
        Self::new(38.22..=38.40, -0.51..=-0.43)
    }
}
