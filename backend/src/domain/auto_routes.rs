//! Random sampling of route requests from a pool of addresses.

use rand::Rng;
use rand::seq::SliceRandom;

use super::route::{RouteRequest, TransportMode};

/// Default upper bound on routes generated per batch.
pub const DEFAULT_AUTO_ROUTE_MAX: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AutoRouteError {
    #[error("at least two distinct addresses are required")]
    TooFewAddresses,
    #[error("count must be between 1 and {max}")]
    CountOutOfRange { max: usize },
}

/// Samples origin/waypoint/destination combinations for auto-generated routes.
#[derive(Debug, Clone, Copy)]
pub struct AutoRoutePlanner {
    max_count: usize,
}

impl Default for AutoRoutePlanner {
    fn default() -> Self {
        Self::new(DEFAULT_AUTO_ROUTE_MAX)
    }
}

impl AutoRoutePlanner {
    pub fn new(max_count: usize) -> Self {
        Self {
            max_count: max_count.max(1),
        }
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    /// Produce `count` unnamed requests.
    ///
    /// Blank and duplicate addresses are ignored. Each request uses two
    /// distinct endpoints and up to `min(2, n - 2)` waypoints drawn from the
    /// remaining addresses, with a uniformly random mode.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        addresses: &[String],
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<RouteRequest>, AutoRouteError> {
        if count == 0 || count > self.max_count {
            return Err(AutoRouteError::CountOutOfRange {
                max: self.max_count,
            });
        }
        let mut pool: Vec<&str> = Vec::with_capacity(addresses.len());
        for address in addresses.iter().map(|a| a.trim()).filter(|a| !a.is_empty()) {
            if !pool.contains(&address) {
                pool.push(address);
            }
        }
        if pool.len() < 2 {
            return Err(AutoRouteError::TooFewAddresses);
        }

        let waypoint_count = 2.min(pool.len() - 2);
        let requests = (0..count)
            .map(|_| {
                let mut picked: Vec<&str> = pool
                    .choose_multiple(rng, waypoint_count + 2)
                    .copied()
                    .collect();
                picked.shuffle(rng);
                let [origin, destination, waypoints @ ..] = picked.as_slice() else {
                    return Err(AutoRouteError::TooFewAddresses);
                };
                let mode = TransportMode::ALL
                    .choose(rng)
                    .copied()
                    .unwrap_or(TransportMode::Walk);
                Ok(RouteRequest {
                    origin: (*origin).to_owned(),
                    waypoints: waypoints.iter().map(|w| (*w).to_owned()).collect(),
                    destination: (*destination).to_owned(),
                    mode,
                    name: None,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(requests)
    }
}
