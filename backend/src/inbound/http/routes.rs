//! Route building, browsing and artifact download endpoints.

use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use super::ApiResult;
use super::envelope::{self, Envelope};
use super::schemas::ErrorEnvelopeSchema;
use super::session::SessionContext;
use super::state::HttpState;
use super::validation::{
    missing_field_error, path_route_name, route_filter_error, route_validation_error,
    transport_mode,
};
use crate::domain::ports::{ArtifactKind, AutoRouteRequest, CreatedRoute};
use crate::domain::{Error, Route, RouteFilter, RouteName, RouteRequest};

/// Manual route request.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateRouteRequest {
    #[schema(example = "Plaza de los Luceros, Alicante")]
    pub origin: String,
    pub waypoints: Vec<String>,
    #[schema(example = "Castillo de Santa Bárbara, Alicante")]
    pub destination: String,
    /// `walk` (default), `bike` or `drive`.
    #[schema(example = "walk")]
    pub mode: Option<String>,
    /// Defaults to `route_{yyyyMMddHHmmss}`.
    pub name: Option<String>,
}

impl CreateRouteRequest {
    fn into_domain(self) -> Result<RouteRequest, Error> {
        let mode = transport_mode(self.mode.as_deref())?;
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(RouteName::new)
            .transpose()
            .map_err(route_validation_error)?;
        RouteRequest::new(&self.origin, &self.waypoints, &self.destination, mode, name)
            .map_err(route_validation_error)
    }
}

/// Auto-generation request: sample `count` routes from `addresses`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AutoRoutesRequest {
    pub addresses: Vec<String>,
    pub count: Option<usize>,
}

/// Raw filter parameters; numeric bounds are parsed by hand so a bad value
/// names its field.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FilterQuery {
    /// `low`, `medium` or `high`.
    pub difficulty: Option<String>,
    /// Upper bound on distance in kilometres.
    #[param(value_type = Option<f64>)]
    pub max_km: Option<String>,
    /// Upper bound on duration in hours.
    #[param(value_type = Option<f64>)]
    pub max_hours: Option<String>,
    /// `walk`, `bike`, `drive` or `all`.
    pub mode: Option<String>,
}

impl FilterQuery {
    fn into_filter(self) -> Result<RouteFilter, Error> {
        let max_km = parse_bound("maxKm", self.max_km.as_deref())?;
        let max_hours = parse_bound("maxHours", self.max_hours.as_deref())?;
        RouteFilter::try_from_parts(
            self.difficulty.as_deref(),
            max_km,
            max_hours,
            self.mode.as_deref(),
        )
        .map_err(route_filter_error)
    }
}

fn parse_bound(field: &'static str, raw: Option<&str>) -> Result<Option<f64>, Error> {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => value.parse::<f64>().map(Some).map_err(|_| {
            Error::invalid_request(format!("{field} must be a number"))
                .with_details(json!({ "field": field, "code": "invalid_bound" }))
        }),
    }
}

/// Build a route for the logged-in user and export its artifacts.
#[utoipa::path(
    post,
    path = "/api/v1/routes",
    request_body = CreateRouteRequest,
    responses(
        (status = 201, description = "Route created", body = Envelope<CreatedRoute>),
        (status = 400, description = "Invalid request or unroutable addresses", body = ErrorEnvelopeSchema),
        (status = 401, description = "Login required", body = ErrorEnvelopeSchema),
        (status = 409, description = "Route name taken", body = ErrorEnvelopeSchema),
        (status = 503, description = "Geocoder or street network unavailable", body = ErrorEnvelopeSchema)
    ),
    tags = ["routes"],
    operation_id = "createRoute"
)]
#[post("/routes")]
pub async fn create_route(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateRouteRequest>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let request = payload.into_inner().into_domain()?;
    let created = state.route_commands.create_manual(&owner, request).await?;
    Ok(envelope::created(created))
}

/// Generate a batch of random routes for the logged-in user.
#[utoipa::path(
    post,
    path = "/api/v1/routes/auto",
    request_body = AutoRoutesRequest,
    responses(
        (status = 201, description = "Routes created", body = Envelope<Vec<CreatedRoute>>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Login required", body = ErrorEnvelopeSchema)
    ),
    tags = ["routes"],
    operation_id = "createAutoRoutes"
)]
#[post("/routes/auto")]
pub async fn create_auto_routes(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AutoRoutesRequest>,
) -> ApiResult<HttpResponse> {
    let owner = session.require_user_id()?;
    let AutoRoutesRequest { addresses, count } = payload.into_inner();
    let count = count.ok_or_else(|| missing_field_error("count"))?;
    let created = state
        .route_commands
        .create_auto(&owner, AutoRouteRequest { addresses, count })
        .await?;
    Ok(envelope::created(created))
}

/// Every stored route, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/routes",
    responses((status = 200, description = "All routes", body = Envelope<Vec<Route>>)),
    tags = ["routes"],
    operation_id = "listRoutes",
    security([])
)]
#[get("/routes")]
pub async fn list_routes(state: web::Data<HttpState>) -> ApiResult<HttpResponse> {
    Ok(envelope::ok(state.routes.list().await?))
}

/// Routes matching every supplied criterion.
#[utoipa::path(
    get,
    path = "/api/v1/routes/filter",
    params(FilterQuery),
    responses(
        (status = 200, description = "Matching routes", body = Envelope<Vec<Route>>),
        (status = 400, description = "Invalid filter", body = ErrorEnvelopeSchema)
    ),
    tags = ["routes"],
    operation_id = "filterRoutes",
    security([])
)]
#[get("/routes/filter")]
pub async fn filter_routes(
    state: web::Data<HttpState>,
    query: web::Query<FilterQuery>,
) -> ApiResult<HttpResponse> {
    let filter = query.into_inner().into_filter()?;
    Ok(envelope::ok(state.routes.filter(filter).await?))
}

/// One route by name.
#[utoipa::path(
    get,
    path = "/api/v1/routes/{name}",
    params(("name" = String, Path)),
    responses(
        (status = 200, description = "Route", body = Envelope<Route>),
        (status = 404, description = "Unknown route", body = ErrorEnvelopeSchema)
    ),
    tags = ["routes"],
    operation_id = "getRoute",
    security([])
)]
#[get("/routes/{name}")]
pub async fn get_route(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let name = path_route_name(&path)?;
    Ok(envelope::ok(state.routes.get(&name).await?))
}

/// Download the PDF, HTML map or GPX export of a route.
#[utoipa::path(
    get,
    path = "/api/v1/routes/{name}/{kind}",
    params(
        ("name" = String, Path),
        ("kind" = String, Path, description = "`pdf`, `html` or `gpx`")
    ),
    responses(
        (status = 200, description = "Artifact bytes", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown route, kind or artifact", body = ErrorEnvelopeSchema)
    ),
    tags = ["routes"],
    operation_id = "downloadArtifact",
    security([])
)]
#[get("/routes/{name}/{kind}")]
pub async fn download_artifact(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (name, kind) = path.into_inner();
    let name = path_route_name(&name)?;
    let kind = downloadable_kind(&kind)?;
    let bytes = state.routes.artifact(&name, kind).await?;
    Ok(HttpResponse::Ok()
        .content_type(kind.content_type())
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(kind.file_name(&name))],
        })
        .body(bytes))
}

fn downloadable_kind(raw: &str) -> Result<ArtifactKind, Error> {
    match raw.parse::<ArtifactKind>() {
        Ok(ArtifactKind::Json) | Err(_) => {
            Err(Error::not_found(format!("unknown download format `{raw}`")))
        }
        Ok(kind) => Ok(kind),
    }
}

#[cfg(test)]
mod tests;
