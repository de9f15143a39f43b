//! Current weather lookup.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use super::ApiResult;
use super::envelope::{self, Envelope};
use super::schemas::ErrorEnvelopeSchema;
use super::state::HttpState;
use super::validation::missing_field_error;
use crate::domain::WeatherReport;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WeatherQueryParams {
    /// City name, e.g. `Alicante`.
    pub city: Option<String>,
}

/// Current conditions for a city.
#[utoipa::path(
    get,
    path = "/api/v1/weather",
    params(WeatherQueryParams),
    responses(
        (status = 200, description = "Current conditions", body = Envelope<WeatherReport>),
        (status = 400, description = "Missing city", body = ErrorEnvelopeSchema),
        (status = 404, description = "Unknown city", body = ErrorEnvelopeSchema),
        (status = 503, description = "Weather provider unavailable", body = ErrorEnvelopeSchema)
    ),
    tags = ["weather"],
    operation_id = "currentWeather",
    security([])
)]
#[get("/weather")]
pub async fn current_weather(
    state: web::Data<HttpState>,
    query: web::Query<WeatherQueryParams>,
) -> ApiResult<HttpResponse> {
    let city = query
        .city
        .as_deref()
        .map(str::trim)
        .filter(|city| !city.is_empty())
        .ok_or_else(|| missing_field_error("city"))?;
    Ok(envelope::ok(state.weather.current(city).await?))
}
