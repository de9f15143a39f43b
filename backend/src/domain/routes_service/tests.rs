//! Tests for the route service.

use super::*;
use crate::domain::ports::{
    FixtureArtifactStore, FixtureGeocoder, FixtureRouteRepository, FixtureStreetNetworkSource,
    ExportReport, FixtureUserRepository, MockRouteArtifactStore,
};
use crate::domain::{
    EmailAddress, ErrorCode, PasswordHash, ServiceArea, TransportMode, UserRecord,
};
use crate::test_support::MutableClock;
use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

const LUCEROS: &str = "Plaza de los Luceros, Alicante";
const CASTLE: &str = "Castillo de Santa Bárbara, Alicante";
const MARKET: &str = "Mercado Central, Alicante";
const BEACH: &str = "Playa del Postiguet, Alicante";

type Service<A> = RouteService<
    FixtureUserRepository,
    FixtureRouteRepository,
    A,
    FixtureGeocoder,
    FixtureStreetNetworkSource,
>;

struct Harness<A> {
    service: Service<A>,
    users: Arc<FixtureUserRepository>,
    routes: Arc<FixtureRouteRepository>,
    artifacts: Arc<A>,
}

fn clock() -> Arc<dyn mockable::Clock> {
    let at = Utc
        .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
        .single()
        .expect("timestamp");
    Arc::new(MutableClock::new(at))
}

fn harness_with<A: RouteArtifactStore>(artifacts: A) -> Harness<A> {
    let users = Arc::new(FixtureUserRepository::default());
    let routes = Arc::new(FixtureRouteRepository::default());
    let artifacts = Arc::new(artifacts);
    let builder = RouteBuilder::new(
        Arc::new(FixtureGeocoder::alicante()),
        Arc::new(FixtureStreetNetworkSource::alicante()),
        clock(),
        ServiceArea::default(),
    );
    let service = RouteService::new(
        Arc::clone(&users),
        Arc::clone(&routes),
        Arc::clone(&artifacts),
        builder,
        AutoRoutePlanner::new(5),
    )
    .with_seed(11);
    Harness {
        service,
        users,
        routes,
        artifacts,
    }
}

#[fixture]
fn harness() -> Harness<FixtureArtifactStore> {
    harness_with(FixtureArtifactStore::default())
}

async fn add_user<A>(harness: &Harness<A>, username: &str) -> UserId {
    let record = UserRecord {
        profile: UserProfile {
            id: UserId::random(),
            username: Username::new(username).expect("username"),
            first_name: format!("{username} first"),
            last_name: format!("{username} last"),
            email: EmailAddress::new(format!("{username}@example.com")).expect("email"),
            phone: None,
            birth_date: None,
            city: None,
            registered_at: Utc::now(),
        },
        password_hash: PasswordHash::new("hash"),
    };
    harness.users.insert(&record).await.expect("insert user");
    record.profile.id
}

fn request(name: Option<&str>) -> RouteRequest {
    RouteRequest::new(
        LUCEROS,
        &[MARKET.to_owned()],
        CASTLE,
        TransportMode::Walk,
        name.map(|n| RouteName::new(n).expect("name")),
    )
    .expect("request")
}

fn username(raw: &str) -> Username {
    Username::new(raw).expect("username")
}

fn route_name(raw: &str) -> RouteName {
    RouteName::new(raw).expect("route name")
}

#[rstest]
#[tokio::test]
async fn created_route_is_retrievable_and_deletable_once(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;

    let created = harness
        .service
        .create_manual(&ana, request(Some("old_town")))
        .await
        .expect("created");
    assert_eq!(created.artifacts, ArtifactKind::ALL.to_vec());
    assert_eq!(created.route.creator.as_ref().map(AsRef::as_ref), Some("ana"));

    let fetched = harness.service.get(&route_name("old_town")).await.expect("get");
    assert_eq!(fetched, created.route);
    let mine = harness.service.routes_of(&username("ana")).await.expect("mine");
    assert_eq!(mine.len(), 1);

    harness
        .service
        .delete_for_user(&ana, &username("ana"), &route_name("old_town"))
        .await
        .expect("first delete");
    let err = harness
        .service
        .delete_for_user(&ana, &username("ana"), &route_name("old_town"))
        .await
        .expect_err("second delete");
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(
        harness.service.get(&route_name("old_town")).await.map(|_| ()),
        Err(Error::not_found("route `old_town` not found"))
    );
    assert!(
        harness
            .artifacts
            .read(&route_name("old_town"), ArtifactKind::Pdf)
            .await
            .is_err()
    );
}

#[rstest]
#[tokio::test]
async fn manual_route_gets_timestamped_default_name(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;
    let created = harness
        .service
        .create_manual(&ana, request(None))
        .await
        .expect("created");
    assert_eq!(created.route.name.as_ref(), "route_20240501093000");
}

#[rstest]
#[tokio::test]
async fn duplicate_route_name_conflicts(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;
    harness
        .service
        .create_manual(&ana, request(Some("loop")))
        .await
        .expect("created");
    let err = harness
        .service
        .create_manual(&ana, request(Some("loop")))
        .await
        .expect_err("duplicate");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn unknown_address_is_invalid_and_nothing_is_persisted(
    harness: Harness<FixtureArtifactStore>,
) {
    let ana = add_user(&harness, "ana").await;
    let bad = RouteRequest::new(LUCEROS, &[], "Atlantis 1", TransportMode::Walk, None)
        .expect("request");
    let err = harness
        .service
        .create_manual(&ana, bad)
        .await
        .expect_err("unknown address");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(harness.service.list().await.expect("list").is_empty());
}

#[rstest]
#[tokio::test]
async fn shared_route_survives_until_last_owner_leaves(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;
    let luis = add_user(&harness, "luis").await;
    harness
        .service
        .create_manual(&ana, request(Some("shared")))
        .await
        .expect("created");
    harness
        .routes
        .link(&luis, &route_name("shared"))
        .await
        .expect("link");

    harness
        .service
        .delete_for_user(&ana, &username("ana"), &route_name("shared"))
        .await
        .expect("ana leaves");
    assert!(harness.service.get(&route_name("shared")).await.is_ok());

    harness
        .service
        .delete_for_user(&luis, &username("luis"), &route_name("shared"))
        .await
        .expect("luis leaves");
    assert!(harness.service.get(&route_name("shared")).await.is_err());
}

#[rstest]
#[tokio::test]
async fn deleting_for_someone_else_is_forbidden(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;
    add_user(&harness, "luis").await;
    let err = harness
        .service
        .delete_for_user(&ana, &username("luis"), &route_name("any"))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn export_failures_do_not_fail_creation() {
    let mut store = MockRouteArtifactStore::new();
    store.expect_export().times(1).returning(|_| ExportReport {
        produced: vec![ArtifactKind::Json],
        failed: vec![(ArtifactKind::Pdf, ArtifactStoreError::render("font missing"))],
    });
    let harness = harness_with(store);
    let ana = add_user(&harness, "ana").await;

    let created = harness
        .service
        .create_manual(&ana, request(Some("partial")))
        .await
        .expect("created despite export failure");

    assert_eq!(created.artifacts, vec![ArtifactKind::Json]);
    assert!(harness.service.get(&route_name("partial")).await.is_ok());
}

#[rstest]
#[tokio::test]
async fn auto_routes_are_named_by_batch_position(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;
    let created = harness
        .service
        .create_auto(
            &ana,
            AutoRouteRequest {
                addresses: vec![LUCEROS.into(), CASTLE.into(), MARKET.into(), BEACH.into()],
                count: 3,
            },
        )
        .await
        .expect("batch");
    let names: Vec<_> = created.iter().map(|c| c.route.name.to_string()).collect();
    assert_eq!(
        names,
        vec![
            "auto_route_1_20240501093000",
            "auto_route_2_20240501093000",
            "auto_route_3_20240501093000",
        ]
    );
    assert!(created.iter().all(|c| c.route.waypoints.len() == 2));
}

#[rstest]
#[case(vec![LUCEROS.to_owned()], 1)]
#[case(vec![LUCEROS.to_owned(), CASTLE.to_owned()], 6)]
#[tokio::test]
async fn auto_routes_validate_input(
    harness: Harness<FixtureArtifactStore>,
    #[case] addresses: Vec<String>,
    #[case] count: usize,
) {
    let ana = add_user(&harness, "ana").await;
    let err = harness
        .service
        .create_auto(&ana, AutoRouteRequest { addresses, count })
        .await
        .expect_err("invalid batch");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[tokio::test]
async fn auto_batch_is_all_or_nothing(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;
    let err = harness
        .service
        .create_auto(
            &ana,
            AutoRouteRequest {
                addresses: vec![LUCEROS.into(), "Atlantis 1".into()],
                count: 2,
            },
        )
        .await
        .expect_err("unknown address in pool");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(harness.service.list().await.expect("list").is_empty());
}

#[rstest]
#[tokio::test]
async fn friends_are_symmetric(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;
    let luis = add_user(&harness, "luis").await;
    add_user(&harness, "marta").await;
    harness
        .service
        .create_manual(&ana, request(Some("shared")))
        .await
        .expect("created");
    harness
        .routes
        .link(&luis, &route_name("shared"))
        .await
        .expect("link");

    let anas = harness.service.friends(&username("ana")).await.expect("ana");
    let luiss = harness.service.friends(&username("luis")).await.expect("luis");
    assert!(anas.contains_key(&username("luis")));
    assert!(luiss.contains_key(&username("ana")));
    assert!(
        harness
            .service
            .friends(&username("marta"))
            .await
            .expect("marta")
            .is_empty()
    );

    let ab = harness
        .service
        .common_routes(&username("ana"), &username("luis"))
        .await
        .expect("ab");
    let ba = harness
        .service
        .common_routes(&username("luis"), &username("ana"))
        .await
        .expect("ba");
    assert_eq!(ab, ba);
    assert_eq!(ab, vec![route_name("shared")]);
}

#[rstest]
#[tokio::test]
async fn unknown_user_queries_are_not_found(harness: Harness<FixtureArtifactStore>) {
    let err = harness
        .service
        .routes_of(&username("ghost"))
        .await
        .expect_err("unknown");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn filter_by_mode_returns_only_matching_routes(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;
    for (name, mode) in [
        ("walk_one", TransportMode::Walk),
        ("bike_one", TransportMode::Bike),
        ("drive_one", TransportMode::Drive),
    ] {
        let request = RouteRequest::new(
            LUCEROS,
            &[],
            CASTLE,
            mode,
            Some(route_name(name)),
        )
        .expect("request");
        harness.service.create_manual(&ana, request).await.expect("created");
    }

    for mode in ["walk", "BIKE", "Drive"] {
        let filter = RouteFilter::try_from_parts(None, None, None, Some(mode)).expect("filter");
        let expected: TransportMode = mode.parse().expect("mode");
        let matched = harness.service.filter(filter).await.expect("filtered");
        assert_eq!(matched.len(), 1);
        assert!(matched.iter().all(|r| r.mode == expected));
    }
    let all = RouteFilter::try_from_parts(None, None, None, Some("all")).expect("filter");
    assert_eq!(harness.service.filter(all).await.expect("all").len(), 3);
}

#[rstest]
#[tokio::test]
async fn serves_artifacts_by_file_name(harness: Harness<FixtureArtifactStore>) {
    let ana = add_user(&harness, "ana").await;
    harness
        .service
        .create_manual(&ana, request(Some("old_town")))
        .await
        .expect("created");

    let (kind, body) = harness
        .service
        .static_file("old_town.gpx")
        .await
        .expect("static file");
    assert_eq!(kind, ArtifactKind::Gpx);
    assert!(!body.is_empty());

    let err = harness
        .service
        .static_file("../old_town.gpx")
        .await
        .expect_err("traversal");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}
