//! Current-weather reports.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::Serialize;
use utoipa::ToSchema;

use super::Error;
use super::ports::{WeatherQuery, WeatherSource, WeatherSourceError};

/// Observed conditions for a city.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    #[schema(example = "Alicante")]
    pub city: String,
    #[schema(example = 25.0)]
    pub temperature_c: f64,
    #[schema(example = 60)]
    pub humidity_pct: u8,
    #[schema(example = "Sunny")]
    pub description: String,
    #[schema(example = 5.0)]
    pub wind_speed_ms: f64,
    pub observed_at: DateTime<Utc>,
}

/// Offline source returning fixed fair-weather conditions.
#[derive(Clone)]
pub struct StubWeatherSource {
    clock: Arc<dyn Clock>,
}

impl StubWeatherSource {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

#[async_trait]
impl WeatherSource for StubWeatherSource {
    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherSourceError> {
        Ok(WeatherReport {
            city: city.to_owned(),
            temperature_c: 25.0,
            humidity_pct: 60,
            description: "Sunny".to_owned(),
            wind_speed_ms: 5.0,
            observed_at: self.clock.utc(),
        })
    }
}

/// Driving-port implementation validating the city and mapping source errors.
pub struct WeatherService<S: ?Sized> {
    source: Arc<S>,
}

impl<S: ?Sized> WeatherService<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }
}

fn map_weather_error(error: WeatherSourceError) -> Error {
    match error {
        WeatherSourceError::CityNotFound { city } => {
            Error::not_found(format!("no weather data for city `{city}`"))
        }
        WeatherSourceError::Unavailable { message } => {
            tracing::warn!(%message, "weather provider unavailable");
            Error::service_unavailable("weather provider unavailable")
        }
        WeatherSourceError::Decode { message } => {
            tracing::error!(%message, "weather provider returned malformed data");
            Error::internal("weather provider returned malformed data")
        }
    }
}

#[async_trait]
impl<S> WeatherQuery for WeatherService<S>
where
    S: WeatherSource + ?Sized,
{
    async fn current(&self, city: &str) -> Result<WeatherReport, Error> {
        let city = city.trim();
        if city.is_empty() {
            return Err(Error::invalid_request("city must not be empty")
                .with_details(serde_json::json!({ "field": "city", "code": "empty" })));
        }
        self.source.current(city).await.map_err(map_weather_error)
    }
}
