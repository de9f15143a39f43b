//! Reqwest-backed OpenWeatherMap source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::CurrentWeatherDto;
use crate::domain::WeatherReport;
use crate::domain::ports::{WeatherSource, WeatherSourceError};

/// Queries `GET {endpoint}?q={city}&appid={key}&units=metric`.
pub struct OpenWeatherMapSource {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
}

impl OpenWeatherMapSource {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, api_key: String, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            api_key: Zeroizing::new(api_key),
        })
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherMapSource {
    async fn current(&self, city: &str) -> Result<WeatherReport, WeatherSourceError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|error| WeatherSourceError::unavailable(error.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| WeatherSourceError::unavailable(error.without_url().to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, city));
        }
        parse_report(body.as_ref())
    }
}

fn parse_report(body: &[u8]) -> Result<WeatherReport, WeatherSourceError> {
    let decoded: CurrentWeatherDto = serde_json::from_slice(body).map_err(|error| {
        WeatherSourceError::decode(format!("invalid OpenWeatherMap JSON payload: {error}"))
    })?;
    decoded.into_report().map_err(WeatherSourceError::decode)
}

fn map_status_error(status: StatusCode, city: &str) -> WeatherSourceError {
    match status {
        StatusCode::NOT_FOUND => WeatherSourceError::city_not_found(city),
        _ => WeatherSourceError::unavailable(format!("status {}", status.as_u16())),
    }
}
