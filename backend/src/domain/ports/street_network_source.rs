//! Port for fetching the street network around a point.

use async_trait::async_trait;

use crate::domain::{Coordinate, NetworkNode, NetworkWay, StreetNetwork, TransportMode};

use super::define_port_error;

define_port_error! {
    /// Errors raised by street-network adapters.
    pub enum StreetNetworkError {
        /// The upstream request timed out.
        Timeout { message: String } => "street network request timed out: {message}",
        /// The upstream service answered with a non-success status.
        Status { status: u16, message: String } => "street network source returned HTTP {status}: {message}",
        /// The request could not be sent.
        Transport { message: String } => "street network transport failed: {message}",
        /// The response body was not a valid network document.
        Decode { message: String } => "street network response could not be decoded: {message}",
    }
}

/// Port returning every mode-appropriate way within `radius_m` of `center`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreetNetworkSource: Send + Sync {
    async fn fetch_around(
        &self,
        center: Coordinate,
        radius_m: u32,
        mode: TransportMode,
    ) -> Result<StreetNetwork, StreetNetworkError>;
}

/// Source returning the same pre-built network for every request.
#[derive(Debug, Clone, Default)]
pub struct FixtureStreetNetworkSource {
    network: StreetNetwork,
}

impl FixtureStreetNetworkSource {
    pub fn new(network: StreetNetwork) -> Self {
        Self { network }
    }

    /// Regular lattice of `rows` x `cols` nodes starting at `south_west`,
    /// spaced `step_deg` apart and joined along rows and columns.
    pub fn grid(south_west: Coordinate, rows: usize, cols: usize, step_deg: f64) -> Self {
        let id = |row: usize, col: usize| (row * cols + col) as i64 + 1;
        let mut nodes = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                let lat = south_west.lat() + row as f64 * step_deg;
                let lon = south_west.lon() + col as f64 * step_deg;
                if let Ok(coord) = Coordinate::new(lat, lon) {
                    nodes.push(NetworkNode {
                        id: id(row, col),
                        coord,
                    });
                }
            }
        }
        let row_ways = (0..rows).map(|row| (0..cols).map(|col| id(row, col)).collect::<Vec<_>>());
        let col_ways = (0..cols).map(|col| (0..rows).map(|row| id(row, col)).collect::<Vec<_>>());
        let ways = row_ways
            .chain(col_ways)
            .enumerate()
            .map(|(index, nodes)| NetworkWay {
                id: index as i64 + 1,
                nodes,
            })
            .collect();
        Self::new(StreetNetwork { nodes, ways })
    }

    /// Lattice covering central Alicante, matching
    /// [`FixtureGeocoder::alicante`](super::FixtureGeocoder::alicante).
    pub fn alicante() -> Self {
        match Coordinate::new(38.3400, -0.4950) {
            Ok(south_west) => Self::grid(south_west, 12, 22, 0.001),
            Err(_) => Self::default(),
        }
    }
}

#[async_trait]
impl StreetNetworkSource for FixtureStreetNetworkSource {
    async fn fetch_around(
        &self,
        _center: Coordinate,
        _radius_m: u32,
        _mode: TransportMode,
    ) -> Result<StreetNetwork, StreetNetworkError> {
        Ok(self.network.clone())
    }
}
