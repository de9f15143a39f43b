//! Reqwest-backed Overpass street-network adapter.
//!
//! This adapter owns transport details only: query construction, timeout and
//! HTTP error mapping, and JSON decoding into a `StreetNetwork`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::dto::OverpassResponseDto;
use crate::domain::ports::{StreetNetworkError, StreetNetworkSource};
use crate::domain::{Coordinate, StreetNetwork, TransportMode};

const DEFAULT_OVERPASS_QUERY_TIMEOUT_SECONDS: u32 = 60;
const DEFAULT_USER_AGENT: &str = "routeshare-backend/0.1";

/// Outbound identity and query timeout settings for Overpass requests.
pub struct OverpassHttpIdentity {
    /// HTTP user-agent sent to Overpass.
    pub user_agent: String,
    /// Timeout directive embedded in Overpass query text.
    pub query_timeout_seconds: u32,
}

impl Default for OverpassHttpIdentity {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            query_timeout_seconds: DEFAULT_OVERPASS_QUERY_TIMEOUT_SECONDS,
        }
    }
}

/// Street-network source that POSTs Overpass QL to one endpoint.
pub struct OverpassStreetNetworkSource {
    client: Client,
    endpoint: Url,
    user_agent: String,
    query_timeout_seconds: u32,
}

impl OverpassStreetNetworkSource {
    /// Build an adapter with explicit outbound identity and query timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        identity: OverpassHttpIdentity,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            user_agent: identity.user_agent,
            query_timeout_seconds: identity.query_timeout_seconds.max(1),
        })
    }
}

#[async_trait]
impl StreetNetworkSource for OverpassStreetNetworkSource {
    async fn fetch_around(
        &self,
        center: Coordinate,
        radius_m: u32,
        mode: TransportMode,
    ) -> Result<StreetNetwork, StreetNetworkError> {
        let query = build_overpass_query(center, radius_m, mode, self.query_timeout_seconds);
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::USER_AGENT, self.user_agent.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[("data", query)])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let network = parse_network(body.as_ref())?;
        debug!(
            nodes = network.nodes.len(),
            ways = network.ways.len(),
            bytes = body.len(),
            %mode,
            "street network fetched"
        );
        Ok(network)
    }
}

fn parse_network(body: &[u8]) -> Result<StreetNetwork, StreetNetworkError> {
    let decoded: OverpassResponseDto = serde_json::from_slice(body).map_err(|error| {
        StreetNetworkError::decode(format!("invalid Overpass JSON payload: {error}"))
    })?;
    decoded.into_network().map_err(StreetNetworkError::decode)
}

fn build_overpass_query(
    center: Coordinate,
    radius_m: u32,
    mode: TransportMode,
    query_timeout_seconds: u32,
) -> String {
    format!(
        "[out:json][timeout:{query_timeout_seconds}];\n\
         way[\"highway\"~\"{filter}\"](around:{radius_m},{lat},{lon});\n\
         (._;>;);\n\
         out body;",
        filter = mode.network_filter(),
        lat = center.lat(),
        lon = center.lon(),
    )
}

fn map_transport_error(error: reqwest::Error) -> StreetNetworkError {
    if error.is_timeout() {
        StreetNetworkError::timeout(error.to_string())
    } else {
        StreetNetworkError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> StreetNetworkError {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            StreetNetworkError::timeout(format!("status {}", status.as_u16()))
        }
        _ => StreetNetworkError::status(status.as_u16(), preview),
    }
}
