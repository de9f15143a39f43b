//! Tests for route API handlers.

use super::*;
use crate::domain::ports::{MockLoginService, MockRouteCommand, MockRouteQuery};
use crate::domain::{
    Difficulty, EmailAddress, TransportMode, UserId, UserProfile, Username,
};
use crate::inbound::http::test_utils::{
    MockedState, mocked_state, read_json, session_cookie, test_session_middleware,
};
use crate::test_support::{MutableClock, in_memory_state};
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test as actix_test};
use chrono::{TimeZone, Utc};
use rstest::rstest;
use serde_json::{Value, json};
use std::sync::Arc;

const ANA_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

fn profile() -> UserProfile {
    UserProfile {
        id: UserId::new(ANA_ID).expect("id"),
        username: Username::new("ana_g").expect("username"),
        first_name: "Ana".into(),
        last_name: "García".into(),
        email: EmailAddress::new("ana@example.com").expect("email"),
        phone: None,
        birth_date: None,
        city: None,
        registered_at: Utc
            .with_ymd_and_hms(2024, 5, 1, 9, 0, 0)
            .single()
            .expect("timestamp"),
    }
}

fn route(name: &str) -> Route {
    Route {
        name: RouteName::new(name).expect("route name"),
        origin: "Plaza de los Luceros, Alicante".into(),
        waypoints: vec![],
        destination: "Castillo de Santa Bárbara, Alicante".into(),
        mode: TransportMode::Walk,
        distance_km: 1.4,
        duration_hours: 0.28,
        difficulty: Difficulty::Low,
        created_at: Utc
            .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
            .single()
            .expect("timestamp"),
        creator: Some(Username::new("ana_g").expect("username")),
    }
}

async fn init_with(
    state: HttpState,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    actix_test::init_service(
        App::new()
            .wrap(test_session_middleware())
            .configure(|cfg| crate::inbound::http::configure(cfg, state)),
    )
    .await
}

async fn init(
    state: MockedState,
) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error> {
    init_with(state.build()).await
}

fn logged_in() -> MockLoginService {
    let mut login = MockLoginService::new();
    login.expect_authenticate().returning(|_| Ok(profile()));
    login
}

async fn login_cookie<S>(app: &S, username: &str, password: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let response = actix_test::call_service(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response).expect("session cookie")
}

#[actix_web::test]
async fn creating_a_route_requires_login() {
    let app = init(mocked_state()).await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/routes")
        .set_json(json!({ "origin": "a", "destination": "b" }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn omitted_mode_and_name_default_before_building() {
    let mut commands = MockRouteCommand::new();
    commands
        .expect_create_manual()
        .withf(|owner, request| {
            owner.to_string() == ANA_ID
                && request.mode == TransportMode::Walk
                && request.name.is_none()
                && request.waypoints == ["Mercado Central, Alicante"]
        })
        .times(1)
        .returning(|_, _| {
            Ok(CreatedRoute {
                route: route("route_20240501093000"),
                artifacts: ArtifactKind::ALL.to_vec(),
            })
        });
    let app = init(mocked_state().login(logged_in()).route_commands(commands)).await;
    let cookie = login_cookie(&app, "ana_g", "s3cret-pass").await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/routes")
        .cookie(cookie)
        .set_json(json!({
            "origin": "Plaza de los Luceros, Alicante",
            "waypoints": ["  ", "Mercado Central, Alicante"],
            "destination": "Castillo de Santa Bárbara, Alicante"
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"]["route"]["name"], "route_20240501093000");
    assert_eq!(body["data"]["artifacts"], json!(["json", "gpx", "html", "pdf"]));
}

#[rstest]
#[case(json!({"origin": "a", "destination": "b", "mode": "teleport"}), "mode")]
#[case(json!({"origin": " ", "destination": "b"}), "origin")]
#[case(json!({"origin": "a", "destination": ""}), "destination")]
#[case(json!({"origin": "a", "destination": "b", "name": "no/slashes"}), "name")]
#[actix_web::test]
async fn invalid_route_requests_name_the_field(#[case] payload: Value, #[case] field: &str) {
    let app = init(mocked_state().login(logged_in())).await;
    let cookie = login_cookie(&app, "ana_g", "s3cret-pass").await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/routes")
        .cookie(cookie)
        .set_json(payload)
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn auto_routes_require_a_count() {
    let app = init(mocked_state().login(logged_in())).await;
    let cookie = login_cookie(&app, "ana_g", "s3cret-pass").await;

    let request = actix_test::TestRequest::post()
        .uri("/api/v1/routes/auto")
        .cookie(cookie)
        .set_json(json!({ "addresses": ["a", "b", "c"] }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["details"]["field"], "count");
}

#[actix_web::test]
async fn filter_parses_every_criterion() {
    let expected = RouteFilter::try_from_parts(Some("low"), Some(5.0), Some(1.5), Some("all"))
        .expect("filter");
    let mut routes = MockRouteQuery::new();
    routes
        .expect_filter()
        .withf(move |filter| *filter == expected)
        .times(1)
        .returning(|_| Ok(vec![route("harbour_loop")]));
    let app = init(mocked_state().routes(routes)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/routes/filter?difficulty=low&maxKm=5&maxHours=1.5&mode=all")
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["data"][0]["name"], "harbour_loop");
}

#[rstest]
#[case("maxKm=abc", "maxKm")]
#[case("maxHours=-1", "maxHours")]
#[case("mode=boat", "mode")]
#[case("difficulty=extreme", "difficulty")]
#[actix_web::test]
async fn invalid_filters_are_bad_requests(#[case] query: &str, #[case] field: &str) {
    let app = init(mocked_state()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/routes/filter?{query}"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn unknown_route_is_not_found() {
    let mut routes = MockRouteQuery::new();
    routes
        .expect_get()
        .returning(|name| Err(crate::domain::Error::not_found(format!("route `{name}` not found"))));
    let app = init(mocked_state().routes(routes)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/routes/ghost")
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[case("json")]
#[case("docx")]
#[actix_web::test]
async fn only_pdf_html_and_gpx_are_downloadable(#[case] kind: &str) {
    let app = init(mocked_state()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/routes/harbour_loop/{kind}"))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn downloads_are_attachments_with_content_type() {
    let mut routes = MockRouteQuery::new();
    routes
        .expect_artifact()
        .withf(|name, kind| name.as_ref() == "harbour_loop" && *kind == ArtifactKind::Gpx)
        .returning(|_, _| Ok(b"<gpx/>".to_vec()));
    let app = init(mocked_state().routes(routes)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/routes/harbour_loop/GPX")
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let header_value = |name| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    assert_eq!(
        header_value(header::CONTENT_TYPE).as_deref(),
        Some("application/gpx+xml")
    );
    let disposition = header_value(header::CONTENT_DISPOSITION).expect("disposition");
    assert!(disposition.starts_with("attachment"), "{disposition}");
    assert!(disposition.contains("harbour_loop.gpx"), "{disposition}");
}

#[actix_web::test]
async fn manual_route_round_trips_through_the_in_memory_stack() {
    let clock = Arc::new(MutableClock::new(
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
            .single()
            .expect("timestamp"),
    ));
    let app = init_with(in_memory_state(clock)).await;
    let app = &app;

    let register = actix_test::TestRequest::post()
        .uri("/api/v1/users")
        .set_json(json!({
            "firstName": "Ana",
            "lastName": "García",
            "email": "ana@example.com",
            "username": "ana_g",
            "password": "s3cret-pass"
        }))
        .to_request();
    assert_eq!(
        actix_test::call_service(app, register).await.status(),
        StatusCode::CREATED
    );
    let cookie = login_cookie(app, "ana_g", "s3cret-pass").await;

    let create = actix_test::TestRequest::post()
        .uri("/api/v1/routes")
        .cookie(cookie)
        .set_json(json!({
            "origin": "Plaza de los Luceros, Alicante",
            "destination": "Castillo de Santa Bárbara, Alicante",
            "mode": "walk"
        }))
        .to_request();
    let created = actix_test::call_service(app, create).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let created: Value = read_json(created).await;
    assert_eq!(created["data"]["route"]["name"], "route_20240501093000");
    assert_eq!(created["data"]["route"]["creator"], "ana_g");

    let listed: Value = read_json(
        actix_test::call_service(
            app,
            actix_test::TestRequest::get()
                .uri("/api/v1/users/ana_g/routes")
                .to_request(),
        )
        .await,
    )
    .await;
    assert_eq!(listed["data"][0]["name"], "route_20240501093000");

    let gpx = actix_test::call_service(
        app,
        actix_test::TestRequest::get()
            .uri("/api/v1/routes/route_20240501093000/gpx")
            .to_request(),
    )
    .await;
    assert_eq!(gpx.status(), StatusCode::OK);
    let static_file = actix_test::call_service(
        app,
        actix_test::TestRequest::get()
            .uri("/static/route_20240501093000.json")
            .to_request(),
    )
    .await;
    assert_eq!(static_file.status(), StatusCode::OK);
}
