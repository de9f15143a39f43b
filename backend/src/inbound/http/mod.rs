//! HTTP inbound adapter exposing the REST API under `/api/v1`.
//!
//! Handlers stay thin: parse the request into domain types, call a driving
//! port from [`HttpState`] and wrap the result in the success envelope.
//! Malformed JSON, query strings and path segments are turned into enveloped
//! `invalid_request` errors by the extractor configs registered in
//! [`configure`].

pub mod envelope;
pub mod error;
pub mod health;
pub mod routes;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
pub mod static_files;
#[cfg(test)]
pub mod test_utils;
pub mod users;
mod validation;
pub mod weather;

use actix_web::{Scope, web};

pub use error::ApiResult;
pub use state::HttpState;

use crate::domain::Error;

/// Every `/api/v1` endpoint. Literal segments are registered before the
/// `{name}` captures they would otherwise collide with.
pub fn api_scope() -> Scope {
    web::scope("/api/v1")
        .service(users::register)
        .service(users::login)
        .service(users::logout)
        .service(users::current_user)
        .service(users::update_profile)
        .service(users::search_users)
        .service(users::delete_account)
        .service(users::user_routes)
        .service(users::delete_user_route)
        .service(users::friends)
        .service(users::common_routes)
        .service(routes::create_route)
        .service(routes::create_auto_routes)
        .service(routes::list_routes)
        .service(routes::filter_routes)
        .service(routes::get_route)
        .service(routes::download_artifact)
        .service(weather::current_weather)
}

/// Register handler state, extractor error handlers, the API scope and the
/// static artifact route on an app.
pub fn configure(cfg: &mut web::ServiceConfig, state: HttpState) {
    cfg.app_data(web::Data::new(state))
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            Error::invalid_request(format!("invalid JSON body: {err}")).into()
        }))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| {
            Error::invalid_request(format!("invalid query string: {err}")).into()
        }))
        .app_data(web::PathConfig::default().error_handler(|err, _req| {
            Error::invalid_request(format!("invalid path: {err}")).into()
        }))
        .service(api_scope())
        .service(static_files::artifact_file);
}
