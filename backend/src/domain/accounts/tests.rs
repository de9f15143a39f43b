//! Tests for the account service.

use super::*;
use crate::domain::ports::{
    FixtureArtifactStore, FixturePasswordHasher, FixtureRouteRepository, FixtureUserRepository,
    MockUserRepository, RouteArtifactStore as _,
};
use crate::domain::{
    Difficulty, ErrorCode, NewUserParts, PlannedRoute, ProfileUpdateParts, Route, RouteName,
    TransportMode,
};
use crate::test_support::MutableClock;
use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

type Service = AccountService<
    FixtureUserRepository,
    FixtureRouteRepository,
    FixtureArtifactStore,
    FixturePasswordHasher,
>;

struct Harness {
    service: Service,
    routes: Arc<FixtureRouteRepository>,
    artifacts: Arc<FixtureArtifactStore>,
}

fn clock() -> Arc<dyn Clock> {
    let at = Utc
        .with_ymd_and_hms(2024, 3, 4, 10, 0, 0)
        .single()
        .expect("timestamp");
    Arc::new(MutableClock::new(at))
}

#[fixture]
fn harness() -> Harness {
    let routes = Arc::new(FixtureRouteRepository::default());
    let artifacts = Arc::new(FixtureArtifactStore::default());
    let service = AccountService::new(
        Arc::new(FixtureUserRepository::default()),
        Arc::clone(&routes),
        Arc::clone(&artifacts),
        Arc::new(FixturePasswordHasher),
        clock(),
    );
    Harness {
        service,
        routes,
        artifacts,
    }
}

fn new_user(username: &str, email: &str) -> NewUser {
    NewUser::try_from_parts(NewUserParts {
        first_name: "Ana",
        last_name: "García",
        email,
        username,
        password: "s3cret",
        ..NewUserParts::default()
    })
    .expect("valid user")
}

fn creds(username: &str, password: &str) -> LoginCredentials {
    LoginCredentials::try_from_parts(username, password).expect("credentials")
}

fn route(name: &str) -> Route {
    Route {
        name: RouteName::new(name).expect("name"),
        origin: "A".into(),
        waypoints: vec![],
        destination: "B".into(),
        mode: TransportMode::Walk,
        distance_km: 2.0,
        duration_hours: 0.4,
        difficulty: Difficulty::Low,
        created_at: Utc::now(),
        creator: None,
    }
}

#[rstest]
#[tokio::test]
async fn registering_same_username_twice_conflicts(harness: Harness) {
    harness
        .service
        .register(new_user("ana", "ana@example.com"))
        .await
        .expect("first registration");
    let err = harness
        .service
        .register(new_user("ana", "other@example.com"))
        .await
        .expect_err("duplicate username");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.details().map(|d| d["field"].clone()), Some("username".into()));
}

#[rstest]
#[tokio::test]
async fn registration_stamps_clock_time(harness: Harness) {
    let profile = harness
        .service
        .register(new_user("ana", "ana@example.com"))
        .await
        .expect("registered");
    assert_eq!(profile.registered_at.to_rfc3339(), "2024-03-04T10:00:00+00:00");
}

#[rstest]
#[case("ana", "s3cret", None)]
#[case("ana", "wrong", Some(ErrorCode::Unauthorized))]
#[case("nobody", "s3cret", Some(ErrorCode::Unauthorized))]
#[case("a b", "s3cret", Some(ErrorCode::Unauthorized))]
#[tokio::test]
async fn login_checks_password_hash(
    harness: Harness,
    #[case] username: &str,
    #[case] password: &str,
    #[case] expected: Option<ErrorCode>,
) {
    harness
        .service
        .register(new_user("ana", "ana@example.com"))
        .await
        .expect("registered");
    let result = harness.service.authenticate(&creds(username, password)).await;
    match (expected, result) {
        (None, Ok(profile)) => assert_eq!(profile.username.as_ref(), "ana"),
        (Some(code), Err(err)) => {
            assert_eq!(err.code(), code);
            assert_eq!(err.message(), "invalid credentials");
        }
        (expected, other) => panic!("expected {expected:?}, got {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn update_profile_rehashes_new_password(harness: Harness) {
    let profile = harness
        .service
        .register(new_user("ana", "ana@example.com"))
        .await
        .expect("registered");
    let update = ProfileUpdate::try_from_parts(ProfileUpdateParts {
        city: Some("Alicante"),
        password: Some("n3w-pass"),
        ..ProfileUpdateParts::default()
    })
    .expect("update");

    let updated = harness
        .service
        .update_profile(&profile.id, update)
        .await
        .expect("updated");

    assert_eq!(updated.city.as_deref(), Some("Alicante"));
    assert!(harness.service.authenticate(&creds("ana", "s3cret")).await.is_err());
    assert!(harness.service.authenticate(&creds("ana", "n3w-pass")).await.is_ok());
}

#[rstest]
#[tokio::test]
async fn deleting_another_account_is_forbidden(harness: Harness) {
    let ana = harness
        .service
        .register(new_user("ana", "ana@example.com"))
        .await
        .expect("ana");
    harness
        .service
        .register(new_user("luis", "luis@example.com"))
        .await
        .expect("luis");

    let target = Username::new("luis").expect("username");
    let err = harness
        .service
        .delete_account(&ana.id, &target)
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn deleting_account_releases_routes(harness: Harness) {
    let ana = harness
        .service
        .register(new_user("ana", "ana@example.com"))
        .await
        .expect("ana");
    let luis = harness
        .service
        .register(new_user("luis", "luis@example.com"))
        .await
        .expect("luis");

    let solo = route("solo");
    let shared = route("shared");
    harness.routes.insert(&solo, &ana.id).await.expect("solo");
    harness.routes.insert(&shared, &ana.id).await.expect("shared");
    harness.routes.link(&luis.id, &shared.name).await.expect("link");
    for r in [&solo, &shared] {
        harness
            .artifacts
            .export(&PlannedRoute {
                route: r.clone(),
                legs: vec![],
                points: vec![],
            })
            .await;
    }

    harness
        .service
        .delete_account(&ana.id, &ana.username)
        .await
        .expect("deleted");

    assert!(harness.routes.find(&solo.name).await.expect("lookup").is_none());
    assert!(harness.routes.find(&shared.name).await.expect("lookup").is_some());
    assert!(
        harness
            .artifacts
            .read(&solo.name, crate::domain::ports::ArtifactKind::Gpx)
            .await
            .is_err()
    );
    let err = harness.service.profile(&ana.id).await.expect_err("gone");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[rstest]
#[tokio::test]
async fn repository_outage_maps_to_service_unavailable() {
    let mut users = MockUserRepository::new();
    users
        .expect_search()
        .return_once(|_| Err(UserPersistenceError::connection("refused")));
    let service = AccountService::new(
        Arc::new(users),
        Arc::new(FixtureRouteRepository::default()),
        Arc::new(FixtureArtifactStore::default()),
        Arc::new(FixturePasswordHasher),
        clock(),
    );
    let err = service.search("an").await.expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
