//! DTOs for decoding Nominatim `jsonv2` search responses.

use serde::Deserialize;

use crate::domain::Coordinate;

/// One search hit. Nominatim encodes coordinates as decimal strings.
#[derive(Debug, Deserialize)]
pub(super) struct NominatimPlaceDto {
    pub(super) lat: String,
    pub(super) lon: String,
    #[serde(default)]
    pub(super) display_name: Option<String>,
}

impl NominatimPlaceDto {
    pub(super) fn into_coordinate(self) -> Result<Coordinate, String> {
        let lat = self
            .lat
            .trim()
            .parse::<f64>()
            .map_err(|error| format!("invalid latitude `{}`: {error}", self.lat))?;
        let lon = self
            .lon
            .trim()
            .parse::<f64>()
            .map_err(|error| format!("invalid longitude `{}`: {error}", self.lon))?;
        Coordinate::new(lat, lon).map_err(|error| error.to_string())
    }
}
