//! Weather ports: the driven provider and the driving lookup use-case.

use async_trait::async_trait;

use crate::domain::{Error, WeatherReport};

use super::define_port_error;

define_port_error! {
    /// Errors raised by weather providers.
    pub enum WeatherSourceError {
        /// The provider does not know the city.
        CityNotFound { city: String } => "no weather data for `{city}`",
        /// The provider could not be reached or rejected the request.
        Unavailable { message: String } => "weather provider unavailable: {message}",
        /// The provider answered with an unexpected body.
        Decode { message: String } => "weather response could not be decoded: {message}",
    }
}

/// Driven port for current conditions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherSourceError>;
}

/// Driving port used by the weather endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WeatherQuery: Send + Sync {
    async fn current(&self, city: &str) -> Result<WeatherReport, Error>;
}
