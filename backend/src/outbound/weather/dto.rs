//! DTOs for the OpenWeatherMap current-weather payload.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::WeatherReport;

#[derive(Debug, Deserialize)]
pub(super) struct CurrentWeatherDto {
    name: String,
    main: MainDto,
    #[serde(default)]
    weather: Vec<ConditionDto>,
    wind: WindDto,
    dt: i64,
}

#[derive(Debug, Deserialize)]
struct MainDto {
    temp: f64,
    humidity: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionDto {
    description: String,
}

#[derive(Debug, Deserialize)]
struct WindDto {
    speed: f64,
}

impl CurrentWeatherDto {
    pub(super) fn into_report(self) -> Result<WeatherReport, String> {
        let observed_at = DateTime::<Utc>::from_timestamp(self.dt, 0)
            .ok_or_else(|| format!("timestamp {} is out of range", self.dt))?;
        let description = self
            .weather
            .into_iter()
            .next()
            .map(|condition| condition.description)
            .ok_or_else(|| "payload has no weather conditions".to_owned())?;
        if !(0.0..=100.0).contains(&self.main.humidity) {
            return Err(format!("humidity {} is not a percentage", self.main.humidity));
        }
        Ok(WeatherReport {
            city: self.name,
            temperature_c: self.main.temp,
            humidity_pct: self.main.humidity.round() as u8,
            description,
            wind_speed_ms: self.wind.speed,
            observed_at,
        })
    }
}
