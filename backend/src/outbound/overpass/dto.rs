//! DTOs for decoding Overpass JSON responses.
//!
//! The adapter decodes into these transport DTOs first, then splits the
//! element list into network nodes and ways in one pass.

use serde::Deserialize;

use crate::domain::{Coordinate, NetworkNode, NetworkWay, StreetNetwork};

#[derive(Debug, Deserialize)]
pub(super) struct OverpassResponseDto {
    #[serde(default)]
    pub(super) elements: Vec<OverpassElementDto>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub(super) enum OverpassElementDto {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
    },
    #[serde(other)]
    Other,
}

impl OverpassResponseDto {
    pub(super) fn into_network(self) -> Result<StreetNetwork, String> {
        let mut network = StreetNetwork::default();
        for element in self.elements {
            match element {
                OverpassElementDto::Node { id, lat, lon } => {
                    let coord = Coordinate::new(lat, lon)
                        .map_err(|error| format!("node {id} has invalid coordinates: {error}"))?;
                    network.nodes.push(NetworkNode { id, coord });
                }
                OverpassElementDto::Way { id, nodes } if nodes.len() >= 2 => {
                    network.ways.push(NetworkWay { id, nodes });
                }
                OverpassElementDto::Way { .. } | OverpassElementDto::Other => {}
            }
        }
        Ok(network)
    }
}
