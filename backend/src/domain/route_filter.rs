//! Route filtering criteria.

use super::route::{Difficulty, ModeFilter, Route, RouteValidationError};

/// Errors raised while building a [`RouteFilter`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteFilterError {
    #[error("{field} must be a finite, non-negative number")]
    InvalidBound { field: &'static str },
    #[error(transparent)]
    Value(#[from] RouteValidationError),
}

impl RouteFilterError {
    /// Query parameter the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidBound { field } => field,
            Self::Value(RouteValidationError::UnknownDifficulty(_)) => "difficulty",
            Self::Value(_) => "mode",
        }
    }
}

/// Conjunction of optional criteria; an empty filter matches every route.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RouteFilter {
    difficulty: Option<Difficulty>,
    max_km: Option<f64>,
    max_hours: Option<f64>,
    mode: Option<ModeFilter>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

impl RouteFilter {
    /// Parse raw query values; blank strings count as absent.
    pub fn try_from_parts(
        difficulty: Option<&str>,
        max_km: Option<f64>,
        max_hours: Option<f64>,
        mode: Option<&str>,
    ) -> Result<Self, RouteFilterError> {
        Ok(Self {
            difficulty: non_blank(difficulty).map(str::parse).transpose()?,
            max_km: bound("maxKm", max_km)?,
            max_hours: bound("maxHours", max_hours)?,
            mode: non_blank(mode).map(str::parse).transpose()?,
        })
    }

    /// Whether every present criterion holds for `route`.
    pub fn matches(&self, route: &Route) -> bool {
        self.difficulty.is_none_or(|d| d == route.difficulty)
            && self.max_km.is_none_or(|max| route.distance_km <= max)
            && self.max_hours.is_none_or(|max| route.duration_hours <= max)
            && self.mode.is_none_or(|mode| mode.matches(route.mode))
    }

    /// Keep only the routes that match.
    pub fn apply(&self, routes: Vec<Route>) -> Vec<Route> {
        routes.into_iter().filter(|route| self.matches(route)).collect()
    }
}

fn bound(field: &'static str, value: Option<f64>) -> Result<Option<f64>, RouteFilterError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(RouteFilterError::InvalidBound { field }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::route::{RouteName, TransportMode};
    use chrono::Utc;
    use rstest::{fixture, rstest};

    fn route(name: &str, mode: TransportMode, km: f64) -> Route {
        Route {
            name: RouteName::new(name).expect("name"),
            origin: "A".into(),
            waypoints: vec![],
            destination: "B".into(),
            mode,
            distance_km: km,
            duration_hours: km / mode.average_speed_kmh(),
            difficulty: Difficulty::from_distance_km(km),
            created_at: Utc::now(),
            creator: None,
        }
    }

    #[fixture]
    fn routes() -> Vec<Route> {
        vec![
            route("stroll", TransportMode::Walk, 3.0),
            route("ride", TransportMode::Bike, 15.0),
            route("commute", TransportMode::Drive, 25.0),
            route("long_walk", TransportMode::Walk, 12.0),
        ]
    }

    fn names(routes: &[Route]) -> Vec<&str> {
        routes.iter().map(|r| r.name.as_ref()).collect()
    }

    #[rstest]
    #[case("walk", vec!["stroll", "long_walk"])]
    #[case("BIKE", vec!["ride"])]
    #[case("Drive", vec!["commute"])]
    #[case("all", vec!["stroll", "ride", "commute", "long_walk"])]
    fn filters_by_mode(routes: Vec<Route>, #[case] mode: &str, #[case] expected: Vec<&str>) {
        let filter = RouteFilter::try_from_parts(None, None, None, Some(mode)).expect("filter");
        let matched = filter.apply(routes);
        assert_eq!(names(&matched), expected);
        if let Ok(only) = mode.parse::<TransportMode>() {
            assert!(matched.iter().all(|r| r.mode == only));
        }
    }

    #[rstest]
    fn combines_criteria(routes: Vec<Route>) {
        let filter =
            RouteFilter::try_from_parts(Some("medium"), Some(15.0), None, Some("walk")).expect("filter");
        assert_eq!(names(&filter.apply(routes)), vec!["long_walk"]);
    }

    #[rstest]
    fn bounds_are_inclusive(routes: Vec<Route>) {
        let filter = RouteFilter::try_from_parts(None, Some(15.0), Some(1.0), None).expect("filter");
        assert_eq!(names(&filter.apply(routes)), vec!["stroll", "ride"]);
    }

    #[rstest]
    fn empty_filter_matches_everything(routes: Vec<Route>) {
        let filter = RouteFilter::try_from_parts(Some(" "), None, None, Some("")).expect("filter");
        assert_eq!(filter.apply(routes).len(), 4);
    }

    #[rstest]
    #[case(Some(-1.0), None, "maxKm")]
    #[case(None, Some(f64::NAN), "maxHours")]
    fn rejects_invalid_bounds(
        #[case] max_km: Option<f64>,
        #[case] max_hours: Option<f64>,
        #[case] field: &str,
    ) {
        let err = RouteFilter::try_from_parts(None, max_km, max_hours, None).expect_err("invalid");
        assert_eq!(err.field(), field);
    }

    #[rstest]
    #[case(Some("extreme"), None, "difficulty")]
    #[case(None, Some("boat"), "mode")]
    fn rejects_unknown_values(
        #[case] difficulty: Option<&str>,
        #[case] mode: Option<&str>,
        #[case] field: &str,
    ) {
        let err = RouteFilter::try_from_parts(difficulty, None, None, mode).expect_err("invalid");
        assert_eq!(err.field(), field);
    }
}
