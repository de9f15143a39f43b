//! Server configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `ROUTESHARE_*` environment variables and an
//! optional configuration file, in that order of precedence. Every field is
//! optional; accessors supply the defaults.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{DEFAULT_AUTO_ROUTE_MAX, ServiceArea};
use crate::inbound::http::session_config::SessionToggles;
use crate::outbound::geocoding::{GeocodeRetryPolicy, NominatimIdentity};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ARTIFACT_DIR: &str = "artifacts";
const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
const DEFAULT_WEATHER_URL: &str = "https://api.openweathermap.org/data/2.5/weather";
const DEFAULT_GEOCODE_INTERVAL_MS: u64 = 1_000;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_OVERPASS_TIMEOUT_SECS: u64 = 60;

/// Where current-weather data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherProvider {
    Stub,
    OpenWeatherMap,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid {field}: '{value}'")]
    Invalid { field: &'static str, value: String },
    #[error("{field} is required when {reason}")]
    Required {
        field: &'static str,
        reason: &'static str,
    },
}

fn invalid(field: &'static str, value: &str) -> SettingsError {
    SettingsError::Invalid {
        field,
        value: value.to_owned(),
    }
}

fn parse_url(field: &'static str, configured: Option<&str>, fallback: &str) -> Result<Url, SettingsError> {
    let raw = configured.unwrap_or(fallback);
    Url::parse(raw).map_err(|_| invalid(field, raw))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrParts {
    Text(String),
    Parts(Vec<String>),
}

/// Environment values containing commas arrive split into a list; rejoin
/// them so `"City, Country"` survives.
fn comma_joined<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<TextOrParts>::deserialize(deserializer)?.map(|value| match value {
        TextOrParts::Text(text) => text,
        TextOrParts::Parts(parts) => parts
            .iter()
            .map(|part| part.trim())
            .collect::<Vec<_>>()
            .join(", "),
    }))
}

#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "ROUTESHARE")]
pub struct AppSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; in-memory repositories are used when absent.
    pub database_url: Option<String>,
    pub session_key_file: Option<PathBuf>,
    pub session_cookie_secure: Option<bool>,
    /// `Strict`, `Lax` or `None`.
    pub session_same_site: Option<String>,
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Directory receiving exported route files.
    pub artifact_dir: Option<PathBuf>,
    /// Use the built-in Alicante geocoder and street lattice instead of
    /// Nominatim and Overpass.
    #[ortho_config(default = false)]
    pub offline_map_data: bool,
    pub nominatim_url: Option<String>,
    pub nominatim_user_agent: Option<String>,
    /// Appended to every address before geocoding.
    #[serde(default, deserialize_with = "comma_joined")]
    pub region_suffix: Option<String>,
    pub geocode_min_interval_ms: Option<u64>,
    pub geocode_max_attempts: Option<u32>,
    pub geocode_initial_backoff_ms: Option<u64>,
    pub geocode_max_backoff_ms: Option<u64>,
    pub http_timeout_secs: Option<u64>,
    pub overpass_url: Option<String>,
    pub overpass_timeout_secs: Option<u64>,
    pub service_area_south: Option<f64>,
    pub service_area_north: Option<f64>,
    pub service_area_west: Option<f64>,
    pub service_area_east: Option<f64>,
    /// `stub` (default) or `openweathermap`.
    pub weather_provider: Option<String>,
    pub weather_url: Option<String>,
    pub weather_api_key: Option<String>,
    /// Upper bound on routes per auto-generation request.
    pub auto_route_max: Option<usize>,
}

impl AppSettings {
    /// # Errors
    ///
    /// Returns an error when the configured address does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| invalid("bindAddr", raw))
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn session_toggles(&self) -> SessionToggles {
        SessionToggles {
            key_file: self.session_key_file.clone(),
            cookie_secure: self.session_cookie_secure,
            same_site: self.session_same_site.clone(),
            allow_ephemeral: self.session_allow_ephemeral,
        }
    }

    pub fn artifact_dir(&self) -> PathBuf {
        self.artifact_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARTIFACT_DIR))
    }

    /// # Errors
    ///
    /// Returns an error when the configured URL does not parse.
    pub fn nominatim_url(&self) -> Result<Url, SettingsError> {
        parse_url("nominatimUrl", self.nominatim_url.as_deref(), DEFAULT_NOMINATIM_URL)
    }

    pub fn nominatim_identity(&self) -> NominatimIdentity {
        let defaults = NominatimIdentity::default();
        NominatimIdentity {
            user_agent: self
                .nominatim_user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
            region_suffix: self.region_suffix.clone().unwrap_or(defaults.region_suffix),
        }
    }

    pub fn geocode_min_interval(&self) -> Duration {
        Duration::from_millis(
            self.geocode_min_interval_ms
                .unwrap_or(DEFAULT_GEOCODE_INTERVAL_MS),
        )
    }

    pub fn geocode_retry_policy(&self) -> GeocodeRetryPolicy {
        let defaults = GeocodeRetryPolicy::default();
        GeocodeRetryPolicy {
            max_attempts: self.geocode_max_attempts.unwrap_or(defaults.max_attempts).max(1),
            initial_backoff: self
                .geocode_initial_backoff_ms
                .map_or(defaults.initial_backoff, Duration::from_millis),
            max_backoff: self
                .geocode_max_backoff_ms
                .map_or(defaults.max_backoff, Duration::from_millis),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// # Errors
    ///
    /// Returns an error when the configured URL does not parse.
    pub fn overpass_url(&self) -> Result<Url, SettingsError> {
        parse_url("overpassUrl", self.overpass_url.as_deref(), DEFAULT_OVERPASS_URL)
    }

    pub fn overpass_timeout(&self) -> Duration {
        Duration::from_secs(
            self.overpass_timeout_secs
                .unwrap_or(DEFAULT_OVERPASS_TIMEOUT_SECS),
        )
    }

    /// Bounding box for route points; unset edges keep the Alicante defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when an edge lies on the wrong side of its opposite.
    pub fn service_area(&self) -> Result<ServiceArea, SettingsError> {
        let (d_south, d_north, d_west, d_east) = ServiceArea::default().edges();
        let south = self.service_area_south.unwrap_or(d_south);
        let north = self.service_area_north.unwrap_or(d_north);
        let west = self.service_area_west.unwrap_or(d_west);
        let east = self.service_area_east.unwrap_or(d_east);
        if !(south < north) {
            return Err(invalid("serviceAreaSouth", &south.to_string()));
        }
        if !(west < east) {
            return Err(invalid("serviceAreaWest", &west.to_string()));
        }
        Ok(ServiceArea::new(south..=north, west..=east))
    }

    /// # Errors
    ///
    /// Returns an error for an unknown provider name.
    pub fn weather_provider(&self) -> Result<WeatherProvider, SettingsError> {
        match self.weather_provider.as_deref().map(str::trim) {
            None | Some("") => Ok(WeatherProvider::Stub),
            Some(raw) if raw.eq_ignore_ascii_case("stub") => Ok(WeatherProvider::Stub),
            Some(raw) if raw.eq_ignore_ascii_case("openweathermap") => {
                Ok(WeatherProvider::OpenWeatherMap)
            }
            Some(raw) => Err(invalid("weatherProvider", raw)),
        }
    }

    /// # Errors
    ///
    /// Returns an error when the configured URL does not parse.
    pub fn weather_url(&self) -> Result<Url, SettingsError> {
        parse_url("weatherUrl", self.weather_url.as_deref(), DEFAULT_WEATHER_URL)
    }

    /// # Errors
    ///
    /// Returns an error when OpenWeatherMap is selected without a key.
    pub fn weather_api_key(&self) -> Result<String, SettingsError> {
        self.weather_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(SettingsError::Required {
                field: "weatherApiKey",
                reason: "weatherProvider is openweathermap",
            })
    }

    pub fn auto_route_max(&self) -> usize {
        self.auto_route_max.unwrap_or(DEFAULT_AUTO_ROUTE_MAX).max(1)
    }
}
