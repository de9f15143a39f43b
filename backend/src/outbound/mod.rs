//! Adapters implementing the domain ports against real infrastructure.
//!
//! - **persistence**: PostgreSQL repositories via Diesel
//! - **geocoding**: Nominatim lookups behind a throttling, retrying wrapper
//! - **overpass**: street networks fetched from the Overpass API
//! - **weather**: OpenWeatherMap current conditions
//! - **password**: Argon2id credential hashing
//! - **export**: JSON, GPX, HTML map and PDF artifacts on the local filesystem

pub mod export;
pub mod geocoding;
pub mod overpass;
pub mod password;
pub mod persistence;
pub mod weather;
