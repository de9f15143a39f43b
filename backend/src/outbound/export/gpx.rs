//! GPX 1.1 track export: one `<trk>` per leg, elevation fixed at zero.

use std::fmt::{self, Write as _};

use chrono::SecondsFormat;

use crate::domain::PlannedRoute;

/// Render `planned` as a GPX 1.1 document.
///
/// # Errors
///
/// Propagates formatter errors; writing into a `String` does not fail in
/// practice.
pub fn render(planned: &PlannedRoute) -> Result<String, fmt::Error> {
    let route = &planned.route;
    let mut xml = String::new();
    writeln!(xml, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        xml,
        r#"<gpx version="1.1" creator="routeshare" xmlns="http://www.topografix.com/GPX/1/1">"#
    )?;
    writeln!(xml, "  <metadata>")?;
    writeln!(xml, "    <name>{}</name>", escape(route.name.as_ref()))?;
    writeln!(
        xml,
        "    <time>{}</time>",
        route.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )?;
    writeln!(xml, "  </metadata>")?;
    for leg in &planned.legs {
        writeln!(xml, "  <trk>")?;
        writeln!(xml, "    <name>Leg {}</name>", leg.index)?;
        writeln!(xml, "    <trkseg>")?;
        for point in &leg.path {
            writeln!(
                xml,
                r#"      <trkpt lat="{}" lon="{}"><ele>0</ele></trkpt>"#,
                point.lat(),
                point.lon()
            )?;
        }
        writeln!(xml, "    </trkseg>")?;
        writeln!(xml, "  </trk>")?;
    }
    writeln!(xml, "</gpx>")?;
    Ok(xml)
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
