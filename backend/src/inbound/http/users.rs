//! Account, session and social endpoints.
//!
//! ```text
//! POST   /api/v1/users                         register
//! POST   /api/v1/login | /api/v1/logout
//! GET    /api/v1/users/me | PUT /api/v1/users/me
//! DELETE /api/v1/users/{username}
//! GET    /api/v1/users/search?name=
//! GET    /api/v1/users/{username}/routes
//! DELETE /api/v1/users/{username}/routes/{route}
//! GET    /api/v1/users/{username}/friends
//! GET    /api/v1/users/{username}/common-routes/{other}
//! ```

use std::collections::BTreeMap;

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::ApiResult;
use super::envelope::{self, Envelope};
use super::schemas::ErrorEnvelopeSchema;
use super::session::SessionContext;
use super::state::HttpState;
use super::validation::{
    login_validation_error, missing_field_error, path_route_name, path_username,
    user_validation_error,
};
use crate::domain::{
    FriendSummary, LoginCredentials, NewUser, NewUserParts, ProfileUpdate, ProfileUpdateParts,
    Route, UserProfile,
};

/// Registration payload.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[schema(example = "Ana")]
    pub first_name: String,
    #[schema(example = "García")]
    pub last_name: String,
    #[schema(example = "ana@example.com")]
    pub email: String,
    #[schema(example = "ana_g")]
    pub username: String,
    pub password: String,
    pub phone: Option<String>,
    #[schema(example = "1990-04-12")]
    pub birth_date: Option<String>,
    pub city: Option<String>,
}

impl RegisterRequest {
    fn parts(&self) -> NewUserParts<'_> {
        NewUserParts {
            first_name: &self.first_name,
            last_name: &self.last_name,
            email: &self.email,
            username: &self.username,
            password: &self.password,
            phone: self.phone.as_deref(),
            birth_date: self.birth_date.as_deref(),
            city: self.city.as_deref(),
        }
    }
}

/// Login payload.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Partial profile edit; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdateRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<String>,
    pub city: Option<String>,
    pub password: Option<String>,
}

impl ProfileUpdateRequest {
    fn parts(&self) -> ProfileUpdateParts<'_> {
        ProfileUpdateParts {
            first_name: self.first_name.as_deref(),
            last_name: self.last_name.as_deref(),
            email: self.email.as_deref(),
            phone: self.phone.as_deref(),
            birth_date: self.birth_date.as_deref(),
            city: self.city.as_deref(),
            password: self.password.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Case-insensitive username fragment.
    pub name: Option<String>,
}

/// Acknowledgement for deletions.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Deleted {
    pub deleted: String,
}

/// Friends keyed by username.
#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = Object)]
pub struct FriendMap(pub BTreeMap<String, FriendSummary>);

/// Create an account.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = Envelope<UserProfile>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 409, description = "Username or email taken", body = ErrorEnvelopeSchema),
        (status = 503, description = "Service unavailable", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let user = NewUser::try_from_parts(payload.parts()).map_err(user_validation_error)?;
    let profile = state.accounts.register(user).await?;
    Ok(envelope::created(profile))
}

/// Authenticate and open a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = Envelope<UserProfile>,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Invalid credentials", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from_parts(&payload.username, &payload.password)
        .map_err(login_validation_error)?;
    let profile = state.login.authenticate(&credentials).await?;
    session.persist_user(&profile.id)?;
    Ok(envelope::ok(profile))
}

/// End the session.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 200, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([])
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    envelope::ok(())
}

/// Profile of the logged-in user.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current profile", body = Envelope<UserProfile>),
        (status = 401, description = "Login required", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let id = session.require_user_id()?;
    Ok(envelope::ok(state.users.profile(&id).await?))
}

/// Edit the logged-in user's profile.
#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated profile", body = Envelope<UserProfile>),
        (status = 400, description = "Invalid request", body = ErrorEnvelopeSchema),
        (status = 401, description = "Login required", body = ErrorEnvelopeSchema),
        (status = 409, description = "Email taken", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[put("/users/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<HttpResponse> {
    let id = session.require_user_id()?;
    let update = ProfileUpdate::try_from_parts(payload.parts()).map_err(user_validation_error)?;
    Ok(envelope::ok(state.accounts.update_profile(&id, update).await?))
}

/// Delete the logged-in user's own account.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Account to delete")),
    responses(
        (status = 200, description = "Account deleted", body = Envelope<Deleted>),
        (status = 401, description = "Login required", body = ErrorEnvelopeSchema),
        (status = 403, description = "Not your account", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "deleteAccount"
)]
#[delete("/users/{username}")]
pub async fn delete_account(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let target = path_username(&path)?;
    state.accounts.delete_account(&actor, &target).await?;
    session.clear();
    Ok(envelope::ok(Deleted {
        deleted: target.into(),
    }))
}

/// Search usernames by substring.
#[utoipa::path(
    get,
    path = "/api/v1/users/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching profiles", body = Envelope<Vec<UserProfile>>),
        (status = 400, description = "Missing name", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "searchUsers",
    security([])
)]
#[get("/users/search")]
pub async fn search_users(
    state: web::Data<HttpState>,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    let name = query
        .name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| missing_field_error("name"))?;
    Ok(envelope::ok(state.users.search(name).await?))
}

/// Routes linked to a user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/routes",
    params(("username" = String, Path)),
    responses(
        (status = 200, description = "Routes, newest first", body = Envelope<Vec<Route>>),
        (status = 404, description = "Unknown user", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "userRoutes",
    security([])
)]
#[get("/users/{username}/routes")]
pub async fn user_routes(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let username = path_username(&path)?;
    Ok(envelope::ok(state.routes.routes_of(&username).await?))
}

/// Remove one of the logged-in user's routes.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}/routes/{route}",
    params(("username" = String, Path), ("route" = String, Path)),
    responses(
        (status = 200, description = "Route unlinked", body = Envelope<Deleted>),
        (status = 401, description = "Login required", body = ErrorEnvelopeSchema),
        (status = 403, description = "Not your account", body = ErrorEnvelopeSchema),
        (status = 404, description = "Route not linked to user", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "deleteUserRoute"
)]
#[delete("/users/{username}/routes/{route}")]
pub async fn delete_user_route(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let (username, route) = path.into_inner();
    let target = path_username(&username)?;
    let route = path_route_name(&route)?;
    state
        .route_commands
        .delete_for_user(&actor, &target, &route)
        .await?;
    Ok(envelope::ok(Deleted {
        deleted: route.into(),
    }))
}

/// Users sharing at least one route with `username`.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/friends",
    params(("username" = String, Path)),
    responses(
        (status = 200, description = "Friends keyed by username", body = Envelope<FriendMap>),
        (status = 404, description = "Unknown user", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "friends",
    security([])
)]
#[get("/users/{username}/friends")]
pub async fn friends(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let username = path_username(&path)?;
    let friends = state
        .routes
        .friends(&username)
        .await?
        .into_iter()
        .map(|(name, summary)| (String::from(name), summary))
        .collect();
    Ok(envelope::ok(FriendMap(friends)))
}

/// Sorted route names linked to both users.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/common-routes/{other}",
    params(("username" = String, Path), ("other" = String, Path)),
    responses(
        (status = 200, description = "Shared route names", body = Envelope<Vec<String>>),
        (status = 404, description = "Unknown user", body = ErrorEnvelopeSchema)
    ),
    tags = ["users"],
    operation_id = "commonRoutes",
    security([])
)]
#[get("/users/{username}/common-routes/{other}")]
pub async fn common_routes(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (a, b) = path.into_inner();
    let (a, b) = (path_username(&a)?, path_username(&b)?);
    let shared: Vec<String> = state
        .routes
        .common_routes(&a, &b)
        .await?
        .into_iter()
        .map(String::from)
        .collect();
    Ok(envelope::ok(shared))
}
