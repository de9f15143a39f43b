//! OpenAPI document for the REST API.
//!
//! Served by Swagger UI in debug builds and exported by the `openapi-dump`
//! binary.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::ports::{ArtifactKind, CreatedRoute};
use crate::domain::{
    Difficulty, ErrorCode, FriendSummary, Route, TransportMode, UserProfile, WeatherReport,
};
use crate::inbound::http::envelope::EnvelopeStatus;
use crate::inbound::http::routes::{AutoRoutesRequest, CreateRouteRequest};
use crate::inbound::http::schemas::ErrorEnvelopeSchema;
use crate::inbound::http::users::{
    Deleted, FriendMap, LoginRequest, ProfileUpdateRequest, RegisterRequest,
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);
        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Routeshare API",
        description = "Build, share and export routes around Alicante; discover friends through shared routes."
    ),
    servers((url = "/", description = "Relative to the deployment base URL")),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::delete_account,
        crate::inbound::http::users::search_users,
        crate::inbound::http::users::user_routes,
        crate::inbound::http::users::delete_user_route,
        crate::inbound::http::users::friends,
        crate::inbound::http::users::common_routes,
        crate::inbound::http::routes::create_route,
        crate::inbound::http::routes::create_auto_routes,
        crate::inbound::http::routes::list_routes,
        crate::inbound::http::routes::filter_routes,
        crate::inbound::http::routes::get_route,
        crate::inbound::http::routes::download_artifact,
        crate::inbound::http::weather::current_weather,
        crate::inbound::http::static_files::artifact_file,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        EnvelopeStatus,
        ErrorEnvelopeSchema,
        ErrorCode,
        UserProfile,
        Route,
        TransportMode,
        Difficulty,
        CreatedRoute,
        ArtifactKind,
        FriendSummary,
        FriendMap,
        WeatherReport,
        Deleted,
        RegisterRequest,
        LoginRequest,
        ProfileUpdateRequest,
        CreateRouteRequest,
        AutoRoutesRequest,
    )),
    tags(
        (name = "users", description = "Accounts, sessions and friends"),
        (name = "routes", description = "Route building, browsing and downloads"),
        (name = "weather", description = "Current weather"),
        (name = "static", description = "Exported route files"),
        (name = "health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
