//! Overpass outbound adapter.
//!
//! This module provides a thin HTTP implementation of the
//! `StreetNetworkSource` port.

mod dto;
mod http_source;

pub use http_source::{OverpassHttpIdentity, OverpassStreetNetworkSource};
