//! Shared test doubles for unit tests (in `src/`) and integration tests (in
//! `tests/`).
//!
//! Deterministic clock, sleepers and jitter let retry and timestamp logic run
//! without wall-clock waits.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;

use crate::domain::ports::{
    FixtureArtifactStore, FixtureGeocoder, FixturePasswordHasher, FixtureRouteRepository,
    FixtureStreetNetworkSource, FixtureUserRepository,
};
use crate::domain::{
    AccountService, AutoRoutePlanner, DEFAULT_AUTO_ROUTE_MAX, RouteBuilder, RouteService,
    ServiceArea, StubWeatherSource, WeatherService,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::geocoding::{BackoffJitter, GeocodeSleeper};

/// Clock frozen at a settable instant.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *self.lock_clock() += delta;
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateSleeper;

#[async_trait]
impl GeocodeSleeper for ImmediateSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Sleeper that records every requested pause instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper(pub Mutex<Vec<Duration>>);

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        match self.0.lock() {
            Ok(entries) => entries.clone(),
            Err(_) => panic!("sleeper mutex"),
        }
    }
}

#[async_trait]
impl GeocodeSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let mut entries = match self.0.lock() {
            Ok(entries) => entries,
            Err(_) => panic!("sleeper mutex"),
        };
        entries.push(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl BackoffJitter for NoJitter {
    fn jittered_delay(&self, base: Duration, _attempt: u32, _now: DateTime<Utc>) -> Duration {
        base
    }
}

/// Fully in-memory handler state: fixture repositories, the Alicante
/// geocoder and street lattice, placeholder artifacts and a seeded sampler.
pub fn in_memory_state(clock: Arc<dyn Clock>) -> HttpState {
    let users = Arc::new(FixtureUserRepository::default());
    let routes = Arc::new(FixtureRouteRepository::default());
    let artifacts = Arc::new(FixtureArtifactStore::default());
    let accounts = AccountService::new(
        users.clone(),
        routes.clone(),
        artifacts.clone(),
        Arc::new(FixturePasswordHasher),
        clock.clone(),
    );
    let builder = RouteBuilder::new(
        Arc::new(FixtureGeocoder::alicante()),
        Arc::new(FixtureStreetNetworkSource::alicante()),
        clock.clone(),
        ServiceArea::default(),
    );
    let route_service = RouteService::new(
        users,
        routes,
        artifacts,
        builder,
        AutoRoutePlanner::new(DEFAULT_AUTO_ROUTE_MAX),
    )
    .with_seed(7);
    let weather = WeatherService::new(Arc::new(StubWeatherSource::new(clock)));
    HttpState::new(Arc::new(accounts), Arc::new(route_service), Arc::new(weather))
}
