//! Builders for the HTTP state: Diesel or in-memory repositories, live or
//! offline map data, and the configured weather provider.

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use routeshare::domain::ports::{
    FixtureGeocoder, FixtureRouteRepository, FixtureStreetNetworkSource, FixtureUserRepository,
    Geocoder, PasswordHasher, RouteArtifactStore, RouteRepository, StreetNetworkSource,
    UserRepository, WeatherSource,
};
use routeshare::domain::{
    AccountService, AutoRoutePlanner, RouteBuilder, RouteService, StubWeatherSource,
    WeatherService,
};
use routeshare::inbound::http::HttpState;
use routeshare::outbound::export::FilesystemArtifactStore;
use routeshare::outbound::geocoding::{NominatimGeocoder, RateLimitedGeocoder};
use routeshare::outbound::overpass::{OverpassHttpIdentity, OverpassStreetNetworkSource};
use routeshare::outbound::password::Argon2PasswordHasher;
use routeshare::outbound::persistence::{DbPool, DieselRouteRepository, DieselUserRepository};
use routeshare::outbound::weather::OpenWeatherMapSource;
use routeshare::settings::{AppSettings, WeatherProvider};

type Repositories = (Arc<dyn UserRepository>, Arc<dyn RouteRepository>);
type MapData = (Arc<dyn Geocoder>, Arc<dyn StreetNetworkSource>);

fn build_repositories(pool: Option<DbPool>) -> Repositories {
    match pool {
        Some(pool) => (
            Arc::new(DieselUserRepository::new(pool.clone())),
            Arc::new(DieselRouteRepository::new(pool)),
        ),
        None => {
            warn!("no database configured; accounts and routes are kept in memory");
            (
                Arc::new(FixtureUserRepository::default()),
                Arc::new(FixtureRouteRepository::default()),
            )
        }
    }
}

fn build_map_data(settings: &AppSettings, clock: Arc<dyn Clock>) -> Result<MapData> {
    if settings.offline_map_data {
        info!("using built-in Alicante map data");
        return Ok((
            Arc::new(FixtureGeocoder::alicante()),
            Arc::new(FixtureStreetNetworkSource::alicante()),
        ));
    }

    let nominatim = NominatimGeocoder::new(
        settings.nominatim_url()?,
        settings.http_timeout(),
        settings.nominatim_identity(),
    )
    .wrap_err("building Nominatim client")?;
    let geocoder = RateLimitedGeocoder::new(
        Arc::new(nominatim),
        settings.geocode_min_interval(),
        settings.geocode_retry_policy(),
        clock,
    );

    let overpass_timeout = settings.overpass_timeout();
    let network = OverpassStreetNetworkSource::new(
        settings.overpass_url()?,
        overpass_timeout,
        OverpassHttpIdentity {
            query_timeout_seconds: u32::try_from(overpass_timeout.as_secs()).unwrap_or(u32::MAX),
            ..OverpassHttpIdentity::default()
        },
    )
    .wrap_err("building Overpass client")?;

    Ok((Arc::new(geocoder), Arc::new(network)))
}

fn build_weather_source(settings: &AppSettings, clock: Arc<dyn Clock>) -> Result<Arc<dyn WeatherSource>> {
    match settings.weather_provider()? {
        WeatherProvider::Stub => Ok(Arc::new(StubWeatherSource::new(clock))),
        WeatherProvider::OpenWeatherMap => {
            let source = OpenWeatherMapSource::new(
                settings.weather_url()?,
                settings.weather_api_key()?,
                settings.http_timeout(),
            )
            .wrap_err("building OpenWeatherMap client")?;
            Ok(Arc::new(source))
        }
    }
}

/// Wire every service behind [`HttpState`].
///
/// Repositories are Diesel-backed when `pool` is present and in-memory
/// otherwise.
///
/// # Errors
///
/// Returns an error when a setting is invalid, an outbound client cannot be
/// built or the artifact directory cannot be opened.
pub fn build_http_state(settings: &AppSettings, pool: Option<DbPool>) -> Result<HttpState> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let (users, routes) = build_repositories(pool);

    let artifact_dir = settings.artifact_dir();
    let artifacts: Arc<dyn RouteArtifactStore> = Arc::new(
        FilesystemArtifactStore::open(&artifact_dir, clock.clone())
            .wrap_err_with(|| format!("opening artifact directory {}", artifact_dir.display()))?,
    );
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::default());

    let accounts = AccountService::new(
        users.clone(),
        routes.clone(),
        artifacts.clone(),
        hasher,
        clock.clone(),
    );

    let (geocoder, network) = build_map_data(settings, clock.clone())?;
    let builder = RouteBuilder::new(geocoder, network, clock.clone(), settings.service_area()?);
    let route_service = RouteService::new(
        users,
        routes,
        artifacts,
        builder,
        AutoRoutePlanner::new(settings.auto_route_max()),
    );

    let weather = WeatherService::new(build_weather_source(settings, clock)?);

    Ok(HttpState::new(
        Arc::new(accounts),
        Arc::new(route_service),
        Arc::new(weather),
    ))
}
