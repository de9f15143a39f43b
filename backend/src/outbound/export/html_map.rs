//! Interactive Leaflet map rendered from a Tera template.

use serde::Serialize;
use tera::{Context, Tera, escape_html};

use crate::domain::{PlannedRoute, PointRole};

const TEMPLATE_NAME: &str = "route_map.html";
const TEMPLATE: &str = include_str!("templates/route_map.html.tera");
const ZOOM: u8 = 14;

#[derive(Serialize)]
struct MarkerView {
    lat: f64,
    lon: f64,
    color: &'static str,
    popup_js: String,
}

#[derive(Serialize)]
struct LegView {
    index: usize,
    points_js: String,
}

/// Renders the route map page; the template is parsed once at construction.
pub struct HtmlMapRenderer {
    tera: Tera,
}

impl HtmlMapRenderer {
    /// # Errors
    ///
    /// Returns an error when the embedded template fails to parse.
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(Self { tera })
    }

    /// Render `planned` centred on its origin.
    ///
    /// # Errors
    ///
    /// Returns an error when the route has no points or rendering fails.
    pub fn render(&self, planned: &PlannedRoute) -> Result<String, tera::Error> {
        let origin = planned
            .points
            .first()
            .ok_or_else(|| tera::Error::msg("route has no points to centre the map on"))?;

        let markers = planned
            .points
            .iter()
            .map(|point| {
                let (color, label) = match point.role {
                    PointRole::Origin => ("green", "Origin"),
                    PointRole::Waypoint => ("orange", "Waypoint"),
                    PointRole::Destination => ("red", "Destination"),
                };
                Ok(MarkerView {
                    lat: point.coord.lat(),
                    lon: point.coord.lon(),
                    color,
                    popup_js: script_literal(&escape_html(&format!("{label}: {}", point.address)))?,
                })
            })
            .collect::<Result<Vec<_>, tera::Error>>()?;

        let legs = planned
            .legs
            .iter()
            .map(|leg| {
                let points: Vec<[f64; 2]> =
                    leg.path.iter().map(|c| [c.lat(), c.lon()]).collect();
                Ok(LegView {
                    index: leg.index,
                    points_js: script_literal(&points)?,
                })
            })
            .collect::<Result<Vec<_>, tera::Error>>()?;

        let mut context = Context::new();
        context.insert("name", planned.route.name.as_ref());
        context.insert("center_lat", &origin.coord.lat());
        context.insert("center_lon", &origin.coord.lon());
        context.insert("zoom", &ZOOM);
        context.insert("markers", &markers);
        context.insert("legs", &legs);
        self.tera.render(TEMPLATE_NAME, &context)
    }
}

/// JSON-encode `value` for embedding inside a `<script>` block.
fn script_literal<T: Serialize + ?Sized>(value: &T) -> Result<String, tera::Error> {
    let json = serde_json::to_string(value).map_err(tera::Error::json)?;
    Ok(json.replace('<', "\\u003c"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbound::export::fixtures::coastal_walk;
    use rstest::{fixture, rstest};

    #[fixture]
    fn renderer() -> HtmlMapRenderer {
        HtmlMapRenderer::new().expect("template parses")
    }

    #[rstest]
    fn centres_on_origin_at_zoom_fourteen(renderer: HtmlMapRenderer) {
        let html = renderer.render(&coastal_walk()).expect("html");
        assert!(html.contains("setView([38.3452, -0.4905], 14)"), "{html}");
        assert!(html.contains("<title>coastal_walk</title>"));
    }

    #[rstest]
    fn colours_markers_by_role(renderer: HtmlMapRenderer) {
        let html = renderer.render(&coastal_walk()).expect("html");
        assert!(html.contains(r#"color: "green""#));
        assert!(html.contains(r#"color: "orange""#));
        assert!(html.contains(r#"color: "red""#));
        assert!(html.contains(r#""Destination: Castillo de Santa Bárbara, Alicante""#));
    }

    #[rstest]
    fn draws_one_polyline_per_leg(renderer: HtmlMapRenderer) {
        let html = renderer.render(&coastal_walk()).expect("html");
        assert_eq!(html.matches("L.polyline(").count(), 2);
        assert!(html.contains("weight: 5, opacity: 0.7"));
        assert!(html.contains("[[38.3452,-0.4905],[38.346,-0.4895],[38.347,-0.488]]"));
    }

    #[rstest]
    fn script_content_cannot_close_the_tag(renderer: HtmlMapRenderer) {
        let mut planned = coastal_walk();
        planned.points[0].address = "</script><b>".into();
        let html = renderer.render(&planned).expect("html");
        assert!(!html.contains("</script><b>"));
        assert!(html.contains("&lt;&#x2F;script&gt;&lt;b&gt;"), "{html}");
    }

    #[rstest]
    fn popup_markup_is_rendered_as_text(renderer: HtmlMapRenderer) {
        let mut planned = coastal_walk();
        planned.points[0].address = "<img src=x onerror=alert(1)>".into();
        let html = renderer.render(&planned).expect("html");
        assert!(!html.contains("<img src=x"), "{html}");
        assert!(html.contains(r#"bindPopup("Origin: &lt;img src=x onerror=alert(1)&gt;")"#), "{html}");
    }

    #[rstest]
    fn refuses_routes_without_points(renderer: HtmlMapRenderer) {
        let mut planned = coastal_walk();
        planned.points.clear();
        assert!(renderer.render(&planned).is_err());
    }
}
