//! Route model: transport modes, difficulty buckets, names and the computed
//! route record returned by the route builder.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::geo::Coordinate;
use super::user::Username;

/// Maximum route name length in characters.
pub const ROUTE_NAME_MAX: usize = 100;

/// Validation errors for route payload values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteValidationError {
    #[error("unknown transport mode `{0}`; expected walk, bike or drive")]
    UnknownMode(String),
    #[error("unknown mode filter `{0}`; expected walk, bike, drive or all")]
    UnknownModeFilter(String),
    #[error("unknown difficulty `{0}`; expected low, medium or high")]
    UnknownDifficulty(String),
    #[error("route name must not be empty")]
    EmptyName,
    #[error("route name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("route name may only contain letters, digits, spaces, `_`, `-` or `.` and must not start with `.`")]
    NameInvalidCharacters,
    #[error("{field} address must not be empty")]
    EmptyAddress { field: &'static str },
}

/// How the route is travelled; selects the street network and average speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Walk,
    Bike,
    Drive,
}

impl TransportMode {
    /// Every mode, in declaration order.
    pub const ALL: [Self; 3] = [Self::Walk, Self::Bike, Self::Drive];

    /// Average speed used to estimate durations.
    pub fn average_speed_kmh(self) -> f64 {
        match self {
            Self::Walk => 5.0,
            Self::Bike => 15.0,
            Self::Drive => 30.0,
        }
    }

    /// Overpass `highway` tag regular expression for this mode's network.
    pub fn network_filter(self) -> &'static str {
        match self {
            Self::Walk => {
                "^(footway|pedestrian|path|steps|living_street|residential|service|track|unclassified|tertiary|secondary|primary)$"
            }
            Self::Bike => {
                "^(cycleway|path|living_street|residential|service|track|unclassified|tertiary|secondary|primary)$"
            }
            Self::Drive => {
                "^(motorway|motorway_link|trunk|trunk_link|primary|primary_link|secondary|secondary_link|tertiary|tertiary_link|unclassified|residential|living_street)$"
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Bike => "bike",
            Self::Drive => "drive",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = RouteValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == lowered)
            .ok_or_else(|| RouteValidationError::UnknownMode(s.to_owned()))
    }
}

/// Mode criterion for route filtering; `all` matches every route.
///
/// # Examples
/// ```
/// use routeshare::domain::{ModeFilter, TransportMode};
///
/// let filter: ModeFilter = "BIKE".parse().unwrap();
/// assert!(filter.matches(TransportMode::Bike));
/// assert!("all".parse::<ModeFilter>().unwrap().matches(TransportMode::Walk));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFilter {
    Any,
    Only(TransportMode),
}

impl ModeFilter {
    pub fn matches(self, mode: TransportMode) -> bool {
        match self {
            Self::Any => true,
            Self::Only(expected) => expected == mode,
        }
    }
}

impl FromStr for ModeFilter {
    type Err = RouteValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::Any);
        }
        s.parse::<TransportMode>()
            .map(Self::Only)
            .map_err(|_| RouteValidationError::UnknownModeFilter(s.to_owned()))
    }
}

/// Difficulty bucket derived from total distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Low,
    Medium,
    High,
}

impl Difficulty {
    /// `< 10 km` low, `< 20 km` medium, otherwise high.
    pub fn from_distance_km(km: f64) -> Self {
        if km < 10.0 {
            Self::Low
        } else if km < 20.0 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Difficulty {
    type Err = RouteValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(RouteValidationError::UnknownDifficulty(s.to_owned())),
        }
    }
}

/// Unique route name, also used as the artifact file stem.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RouteName(String);

impl RouteName {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, RouteValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(RouteValidationError::EmptyName);
        }
        if trimmed.chars().count() > ROUTE_NAME_MAX {
            return Err(RouteValidationError::NameTooLong {
                max: ROUTE_NAME_MAX,
            });
        }
        let allowed = |c: char| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-' | '.');
        if trimmed.starts_with('.') || !trimmed.chars().all(allowed) {
            return Err(RouteValidationError::NameInvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Name given to manual routes created without one.
    pub fn manual_default(now: DateTime<Utc>) -> Self {
        Self(format!("route_{}", now.format("%Y%m%d%H%M%S")))
    }

    /// Name given to the `index`-th (1-based) route of an auto-generated batch.
    pub fn auto_default(index: usize, now: DateTime<Utc>) -> Self {
        Self(format!("auto_route_{index}_{}", now.format("%Y%m%d%H%M%S")))
    }
}

impl AsRef<str> for RouteName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RouteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<RouteName> for String {
    fn from(value: RouteName) -> Self {
        value.0
    }
}

impl TryFrom<String> for RouteName {
    type Error = RouteValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Addresses and options for one route to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub origin: String,
    pub waypoints: Vec<String>,
    pub destination: String,
    pub mode: TransportMode,
    pub name: Option<RouteName>,
}

impl RouteRequest {
    /// Trim addresses, drop blank waypoints and reject blank endpoints.
    pub fn new(
        origin: &str,
        waypoints: &[String],
        destination: &str,
        mode: TransportMode,
        name: Option<RouteName>,
    ) -> Result<Self, RouteValidationError> {
        let origin = origin.trim();
        if origin.is_empty() {
            return Err(RouteValidationError::EmptyAddress { field: "origin" });
        }
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(RouteValidationError::EmptyAddress {
                field: "destination",
            });
        }
        Ok(Self {
            origin: origin.to_owned(),
            waypoints: waypoints
                .iter()
                .map(|w| w.trim())
                .filter(|w| !w.is_empty())
                .map(str::to_owned)
                .collect(),
            destination: destination.to_owned(),
            mode,
            name,
        })
    }

    /// Origin, waypoints and destination in travel order.
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.origin.as_str())
            .chain(self.waypoints.iter().map(String::as_str))
            .chain(std::iter::once(self.destination.as_str()))
    }
}

/// Persisted route record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[schema(value_type = String, example = "route_20240501093000")]
    pub name: RouteName,
    #[schema(example = "Plaza de los Luceros, Alicante")]
    pub origin: String,
    pub waypoints: Vec<String>,
    #[schema(example = "Castillo de Santa Bárbara, Alicante")]
    pub destination: String,
    pub mode: TransportMode,
    #[schema(example = 4.27)]
    pub distance_km: f64,
    #[schema(example = 0.854)]
    pub duration_hours: f64,
    pub difficulty: Difficulty,
    pub created_at: DateTime<Utc>,
    #[schema(value_type = Option<String>)]
    pub creator: Option<Username>,
}

impl Route {
    /// Distance formatted as `"{:.2} km"`.
    pub fn distance_label(&self) -> String {
        format!("{:.2} km", self.distance_km)
    }

    /// Duration formatted as `"{h} h {m} min"`, or `"{m} min"` under an hour.
    pub fn duration_label(&self) -> String {
        let (hours, minutes) = split_hours(self.duration_hours);
        if hours > 0 {
            format!("{hours} h {minutes} min")
        } else {
            format!("{minutes} min")
        }
    }
}

/// One shortest-path segment between consecutive route points.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    /// 1-based position within the route.
    pub index: usize,
    pub from: String,
    pub to: String,
    pub path: Vec<Coordinate>,
    pub length_m: f64,
    pub duration_hours: f64,
}

impl RouteLeg {
    pub fn distance_km(&self) -> f64 {
        self.length_m / 1000.0
    }
}

/// Compact leg duration: `"{h}h {m}m"`, or `"{m}m"` under an hour.
pub fn leg_duration_label(duration_hours: f64) -> String {
    let (hours, minutes) = split_hours(duration_hours);
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

fn split_hours(duration_hours: f64) -> (u64, u64) {
    let total_minutes = (duration_hours.max(0.0) * 60.0).round() as u64;
    (total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
            .single()
            .expect("valid timestamp")
    }

    fn route(distance_km: f64, duration_hours: f64) -> Route {
        Route {
            name: RouteName::new("sample").expect("name"),
            origin: "A".into(),
            waypoints: vec![],
            destination: "B".into(),
            mode: TransportMode::Walk,
            distance_km,
            duration_hours,
            difficulty: Difficulty::from_distance_km(distance_km),
            created_at: at(),
            creator: None,
        }
    }

    #[rstest]
    #[case("walk", TransportMode::Walk)]
    #[case("BIKE", TransportMode::Bike)]
    #[case(" Drive ", TransportMode::Drive)]
    fn parses_modes_case_insensitively(#[case] raw: &str, #[case] expected: TransportMode) {
        assert_eq!(raw.parse::<TransportMode>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_mode() {
        assert!(matches!(
            "swim".parse::<TransportMode>(),
            Err(RouteValidationError::UnknownMode(_))
        ));
        assert!("all".parse::<TransportMode>().is_err());
    }

    #[rstest]
    #[case("all", TransportMode::Walk, true)]
    #[case("ALL", TransportMode::Drive, true)]
    #[case("walk", TransportMode::Walk, true)]
    #[case("walk", TransportMode::Bike, false)]
    #[case("Drive", TransportMode::Drive, true)]
    fn mode_filter_matching(#[case] raw: &str, #[case] mode: TransportMode, #[case] expected: bool) {
        let filter: ModeFilter = raw.parse().expect("recognised filter");
        assert_eq!(filter.matches(mode), expected);
    }

    #[rstest]
    #[case(TransportMode::Walk, 5.0)]
    #[case(TransportMode::Bike, 15.0)]
    #[case(TransportMode::Drive, 30.0)]
    fn speed_table(#[case] mode: TransportMode, #[case] kmh: f64) {
        assert_eq!(mode.average_speed_kmh(), kmh);
    }

    #[rstest]
    #[case(0.0, Difficulty::Low)]
    #[case(9.99, Difficulty::Low)]
    #[case(10.0, Difficulty::Medium)]
    #[case(19.99, Difficulty::Medium)]
    #[case(20.0, Difficulty::High)]
    fn difficulty_buckets(#[case] km: f64, #[case] expected: Difficulty) {
        assert_eq!(Difficulty::from_distance_km(km), expected);
    }

    #[rstest]
    #[case(" Costa Blanca loop ", "Costa Blanca loop")]
    #[case("ruta-1.v2", "ruta-1.v2")]
    #[case("Playa_San_Juan", "Playa_San_Juan")]
    fn accepts_route_names(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(RouteName::new(raw).expect("valid").as_ref(), expected);
    }

    #[rstest]
    #[case("", RouteValidationError::EmptyName)]
    #[case("../etc/passwd", RouteValidationError::NameInvalidCharacters)]
    #[case(".hidden", RouteValidationError::NameInvalidCharacters)]
    #[case("a/b", RouteValidationError::NameInvalidCharacters)]
    fn rejects_route_names(#[case] raw: &str, #[case] expected: RouteValidationError) {
        assert_eq!(RouteName::new(raw), Err(expected));
    }

    #[rstest]
    fn default_names_embed_timestamp() {
        assert_eq!(
            RouteName::manual_default(at()).as_ref(),
            "route_20240501093000"
        );
        assert_eq!(
            RouteName::auto_default(3, at()).as_ref(),
            "auto_route_3_20240501093000"
        );
    }

    #[rstest]
    #[case(4.2666, 0.5, "4.27 km", "30 min")]
    #[case(31.0, 2.0667, "31.00 km", "2 h 4 min")]
    #[case(15.0, 1.0, "15.00 km", "1 h 0 min")]
    fn route_labels(
        #[case] km: f64,
        #[case] hours: f64,
        #[case] distance: &str,
        #[case] duration: &str,
    ) {
        let route = route(km, hours);
        assert_eq!(route.distance_label(), distance);
        assert_eq!(route.duration_label(), duration);
    }

    #[rstest]
    #[case(0.25, "15m")]
    #[case(1.5, "1h 30m")]
    fn leg_labels(#[case] hours: f64, #[case] expected: &str) {
        assert_eq!(leg_duration_label(hours), expected);
    }

    #[rstest]
    fn request_drops_blank_waypoints() {
        let request = RouteRequest::new(
            " A ",
            &["".into(), " W ".into()],
            "B",
            TransportMode::Bike,
            None,
        )
        .expect("valid request");
        assert_eq!(request.addresses().collect::<Vec<_>>(), vec!["A", "W", "B"]);
    }

    #[rstest]
    fn request_rejects_blank_destination() {
        let err = RouteRequest::new("A", &[], "  ", TransportMode::Walk, None).expect_err("blank");
        assert_eq!(
            err,
            RouteValidationError::EmptyAddress {
                field: "destination"
            }
        );
    }

    #[rstest]
    fn route_serialises_lowercase_enums() {
        let value = serde_json::to_value(route(12.0, 2.4)).expect("serialises");
        assert_eq!(value["mode"], "walk");
        assert_eq!(value["difficulty"], "medium");
        assert_eq!(value["distanceKm"], 12.0);
    }
}
