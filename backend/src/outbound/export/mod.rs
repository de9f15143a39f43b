//! Route exporters and the filesystem artifact store.
//!
//! Each renderer is a pure function of a `PlannedRoute`; the store runs them
//! independently so one failing format never blocks the others.

pub mod gpx;
pub mod html_map;
pub mod pdf;
mod store;

pub use html_map::HtmlMapRenderer;
pub use store::FilesystemArtifactStore;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::domain::{
        Coordinate, Difficulty, PlannedRoute, PointRole, Route, RouteLeg, RouteName, RoutePoint,
        TransportMode,
    };

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).expect("coordinate")
    }

    /// Two-leg walk from Luceros to the castle via the central market.
    pub(crate) fn coastal_walk() -> PlannedRoute {
        let created_at = Utc
            .with_ymd_and_hms(2024, 5, 1, 9, 30, 0)
            .single()
            .expect("timestamp");
        let legs = vec![
            RouteLeg {
                index: 1,
                from: "Plaza de los Luceros, Alicante".into(),
                to: "Mercado Central, Alicante".into(),
                path: vec![
                    coord(38.3452, -0.4905),
                    coord(38.3460, -0.4895),
                    coord(38.3470, -0.4880),
                ],
                length_m: 850.0,
                duration_hours: 0.17,
            },
            RouteLeg {
                index: 2,
                from: "Mercado Central, Alicante".into(),
                to: "Castillo de Santa Bárbara, Alicante".into(),
                path: vec![
                    coord(38.3470, -0.4880),
                    coord(38.3480, -0.4830),
                    coord(38.3490, -0.4780),
                ],
                length_m: 1_420.5,
                duration_hours: 0.2841,
            },
        ];
        let points = vec![
            RoutePoint {
                address: "Plaza de los Luceros, Alicante".into(),
                coord: coord(38.3452, -0.4905),
                role: PointRole::Origin,
            },
            RoutePoint {
                address: "Mercado Central, Alicante".into(),
                coord: coord(38.3470, -0.4880),
                role: PointRole::Waypoint,
            },
            RoutePoint {
                address: "Castillo de Santa Bárbara, Alicante".into(),
                coord: coord(38.3490, -0.4780),
                role: PointRole::Destination,
            },
        ];
        PlannedRoute {
            route: Route {
                name: RouteName::new("coastal_walk").expect("name"),
                origin: "Plaza de los Luceros, Alicante".into(),
                waypoints: vec!["Mercado Central, Alicante".into()],
                destination: "Castillo de Santa Bárbara, Alicante".into(),
                mode: TransportMode::Walk,
                distance_km: 2.2705,
                duration_hours: 0.4541,
                difficulty: Difficulty::Low,
                created_at,
                creator: None,
            },
            legs,
            points,
        }
    }
}
