//! Raw artifact files served from `/static/{file}`.

use actix_web::{HttpResponse, get, http::header::CacheControl, http::header::CacheDirective, web};

use super::ApiResult;
use super::schemas::ErrorEnvelopeSchema;
use super::state::HttpState;

/// Serve `{route}.{json,gpx,html,pdf}` from the artifact directory.
#[utoipa::path(
    get,
    path = "/static/{file}",
    params(("file" = String, Path, description = "Artifact file name, e.g. `harbour_loop.gpx`")),
    responses(
        (status = 200, description = "File contents"),
        (status = 400, description = "Unsafe or unsupported file name", body = ErrorEnvelopeSchema),
        (status = 404, description = "No such artifact", body = ErrorEnvelopeSchema)
    ),
    tags = ["static"],
    operation_id = "artifactFile",
    security([])
)]
#[get("/static/{file}")]
pub async fn artifact_file(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let (kind, bytes) = state.routes.static_file(&path).await?;
    Ok(HttpResponse::Ok()
        .content_type(kind.content_type())
        .insert_header(CacheControl(vec![CacheDirective::NoCache]))
        .body(bytes))
}
