//! Rate-limiting, retrying decorator around any [`Geocoder`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::warn;

use super::retry::{AttemptJitter, BackoffJitter, GeocodeRetryPolicy, GeocodeSleeper, TokioSleeper};
use crate::domain::Coordinate;
use crate::domain::ports::{GeocodeError, Geocoder};

/// Serialises calls to `inner` so consecutive requests start at least
/// `min_interval` apart, retrying transient failures per the policy.
pub struct RateLimitedGeocoder<G: ?Sized> {
    inner: Arc<G>,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
    policy: GeocodeRetryPolicy,
    sleeper: Arc<dyn GeocodeSleeper>,
    jitter: Arc<dyn BackoffJitter>,
    clock: Arc<dyn Clock>,
}

impl<G> RateLimitedGeocoder<G>
where
    G: Geocoder + ?Sized,
{
    pub fn new(
        inner: Arc<G>,
        min_interval: Duration,
        policy: GeocodeRetryPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            min_interval,
            last_call: Mutex::new(None),
            policy,
            sleeper: Arc::new(TokioSleeper),
            jitter: Arc::new(AttemptJitter),
            clock,
        }
    }

    /// Replace the sleeper and jitter strategy.
    #[must_use]
    pub fn with_runtime(
        mut self,
        sleeper: Arc<dyn GeocodeSleeper>,
        jitter: Arc<dyn BackoffJitter>,
    ) -> Self {
        self.sleeper = sleeper;
        self.jitter = jitter;
        self
    }

    async fn throttled(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                self.sleeper.sleep(self.min_interval - elapsed).await;
            }
        }
        let result = self.inner.geocode(address).await;
        *last_call = Some(Instant::now());
        result
    }
}

#[async_trait]
impl<G> Geocoder for RateLimitedGeocoder<G>
where
    G: Geocoder + ?Sized,
{
    async fn geocode(&self, address: &str) -> Result<Coordinate, GeocodeError> {
        let mut attempt = 1;
        loop {
            match self.throttled(address).await {
                Ok(coord) => return Ok(coord),
                Err(error) if self.policy.should_retry(attempt, &error) => {
                    let delay = self.jitter.jittered_delay(
                        self.policy.backoff_for(attempt),
                        attempt,
                        self.clock.utc(),
                    );
                    warn!(%address, attempt, %error, ?delay, "retrying geocode");
                    self.sleeper.sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::MockGeocoder;
    use crate::test_support::{ImmediateSleeper, MutableClock, NoJitter, RecordingSleeper};
    use chrono::{TimeZone, Utc};
    use mockall::Sequence;
    use rstest::rstest;

    fn clock() -> Arc<dyn Clock> {
        let at = Utc
            .with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .expect("timestamp");
        Arc::new(MutableClock::new(at))
    }

    fn luceros() -> Coordinate {
        Coordinate::new(38.3452, -0.4905).expect("coordinate")
    }

    fn limited(inner: MockGeocoder, sleeper: Arc<dyn GeocodeSleeper>) -> RateLimitedGeocoder<MockGeocoder> {
        RateLimitedGeocoder::new(
            Arc::new(inner),
            Duration::from_secs(1),
            GeocodeRetryPolicy::default(),
            clock(),
        )
        .with_runtime(sleeper, Arc::new(NoJitter))
    }

    #[rstest]
    #[tokio::test]
    async fn retries_transient_failures_with_backoff() {
        let mut inner = MockGeocoder::new();
        let mut seq = Sequence::new();
        inner
            .expect_geocode()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(GeocodeError::status(503_u16, "busy")));
        inner
            .expect_geocode()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(GeocodeError::timeout("slow")));
        inner
            .expect_geocode()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(luceros()));
        let sleeper = Arc::new(RecordingSleeper::default());
        let geocoder = limited(inner, sleeper.clone());

        let coord = geocoder.geocode("Luceros").await.expect("third attempt");

        assert_eq!(coord, luceros());
        let backoffs: Vec<_> = sleeper
            .recorded()
            .into_iter()
            .filter(|d| *d >= Duration::from_millis(500))
            .collect();
        assert_eq!(
            backoffs.first().copied(),
            Some(Duration::from_millis(500))
        );
        assert!(backoffs.contains(&Duration::from_secs(1)));
    }

    #[rstest]
    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let mut inner = MockGeocoder::new();
        inner
            .expect_geocode()
            .times(3)
            .returning(|_| Err(GeocodeError::status(429_u16, "slow down")));
        let geocoder = limited(inner, Arc::new(ImmediateSleeper));

        let error = geocoder.geocode("Luceros").await.expect_err("exhausted");
        assert_eq!(error, GeocodeError::status(429_u16, "slow down"));
    }

    #[rstest]
    #[case(GeocodeError::not_found("Nowhere"))]
    #[case(GeocodeError::transport("connection refused"))]
    #[case(GeocodeError::decode("bad json"))]
    #[tokio::test]
    async fn permanent_failures_are_not_retried(#[case] failure: GeocodeError) {
        let mut inner = MockGeocoder::new();
        let returned = failure.clone();
        inner
            .expect_geocode()
            .times(1)
            .return_once(move |_| Err(returned));
        let geocoder = limited(inner, Arc::new(ImmediateSleeper));

        assert_eq!(geocoder.geocode("x").await, Err(failure));
    }

    #[rstest]
    #[tokio::test]
    async fn consecutive_calls_wait_for_min_interval() {
        let mut inner = MockGeocoder::new();
        inner.expect_geocode().times(2).returning(|_| Ok(luceros()));
        let sleeper = Arc::new(RecordingSleeper::default());
        let geocoder = limited(inner, sleeper.clone());

        geocoder.geocode("a").await.expect("first");
        assert!(sleeper.recorded().is_empty());
        geocoder.geocode("b").await.expect("second");

        let waits = sleeper.recorded();
        assert_eq!(waits.len(), 1);
        assert!(waits[0] > Duration::ZERO && waits[0] <= Duration::from_secs(1));
    }
}
