//! Weather outbound adapter backed by OpenWeatherMap.

mod dto;
mod openweathermap;

pub use openweathermap::OpenWeatherMapSource;
