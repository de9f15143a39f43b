//! Bounded retry policy for geocoding calls.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::ports::GeocodeError;

/// Async pause used between attempts and by the rate limiter.
#[async_trait]
pub trait GeocodeSleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Spreads retry delays so concurrent callers do not wake together.
pub trait BackoffJitter: Send + Sync {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration;
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl GeocodeSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Adds up to a quarter of the base delay, seeded from the clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct AttemptJitter;

impl BackoffJitter for AttemptJitter {
    fn jittered_delay(&self, base: Duration, attempt: u32, now: DateTime<Utc>) -> Duration {
        let base_ms = u64::try_from(base.as_millis()).unwrap_or(u64::MAX);
        let max_extra = (base_ms / 4).max(1);
        let seed = u64::from(now.timestamp_subsec_nanos()) ^ u64::from(attempt);
        let extra = seed % max_extra.saturating_add(1);
        Duration::from_millis(base_ms.saturating_add(extra))
    }
}

/// How many times to try a geocoding call and how long to wait in between.
///
/// Delays double after every failed attempt starting from
/// `initial_backoff`, capped at `max_backoff`. Only transient errors
/// (timeouts, HTTP 429 and 5xx) are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeocodeRetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for GeocodeRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl GeocodeRetryPolicy {
    /// Base delay after the `attempt`-th failure (1-based).
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use routeshare::outbound::geocoding::GeocodeRetryPolicy;
    ///
    /// let policy = GeocodeRetryPolicy::default();
    /// assert_eq!(policy.backoff_for(2), Duration::from_secs(1));
    /// ```
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.initial_backoff
            .saturating_mul(1_u32 << exponent)
            .min(self.max_backoff)
    }

    /// Whether another attempt should follow the `attempt`-th failure.
    pub fn should_retry(&self, attempt: u32, error: &GeocodeError) -> bool {
        attempt < self.max_attempts.max(1) && error.is_transient()
    }
}
