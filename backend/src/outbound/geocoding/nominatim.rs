//! Reqwest-backed Nominatim geocoder.
//!
//! The adapter owns transport details only: query construction, timeout and
//! HTTP status mapping, and decoding the first hit into a coordinate. Rate
//! limiting and retries are layered on by `RateLimitedGeocoder`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::dto::NominatimPlaceDto;
use crate::domain::Coordinate;
use crate::domain::ports::{GeocodeError, Geocoder};

const DEFAULT_USER_AGENT: &str = "routeshare-backend/0.1";
const DEFAULT_REGION_SUFFIX: &str = "Alicante, Spain";

/// Outbound identity and query scoping for Nominatim requests.
#[derive(Debug, Clone)]
pub struct NominatimIdentity {
    /// HTTP user-agent required by the Nominatim usage policy.
    pub user_agent: String,
    /// Appended to every address as `"{address}, {suffix}"`.
    pub region_suffix: String,
}

impl Default for NominatimIdentity {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            region_suffix: DEFAULT_REGION_SUFFIX.to_owned(),
        }
    }
}

/// Geocoder performing `GET {endpoint}?q=..&format=jsonv2&limit=1`.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: Url,
    identity: NominatimIdentity,
}

impl NominatimGeocoder {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        identity: NominatimIdentity,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(identity.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            endpoint,
            identity,
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let query = build_query(address, &self.identity.region_suffix);
        let response = self
            .client
            .get(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .query(&[("q", query.as_str()), ("format", "jsonv2"), ("limit", "1")])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_first_hit(address, body.as_ref())
    }
}

fn build_query(address: &str, region_suffix: &str) -> String {
    let address = address.trim();
    let suffix = region_suffix.trim();
    if suffix.is_empty() {
        address.to_owned()
    } else {
        format!("{address}, {suffix}")
    }
}

fn parse_first_hit(address: &str, body: &[u8]) -> Result<Coordinate, GeocodeError> {
    let places: Vec<NominatimPlaceDto> = serde_json::from_slice(body).map_err(|error| {
        GeocodeError::decode(format!("invalid Nominatim JSON payload: {error}"))
    })?;
    let Some(place) = places.into_iter().next() else {
        return Err(GeocodeError::not_found(address));
    };
    debug!(%address, display_name = ?place.display_name, "geocoded");
    place.into_coordinate().map_err(GeocodeError::decode)
}

fn map_transport_error(error: reqwest::Error) -> GeocodeError {
    if error.is_timeout() {
        GeocodeError::timeout(error.to_string())
    } else {
        GeocodeError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> GeocodeError {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            GeocodeError::timeout(format!("status {}", status.as_u16()))
        }
        _ => GeocodeError::status(status.as_u16(), preview),
    }
}
