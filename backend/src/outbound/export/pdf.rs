//! PDF route summary built with printpdf.

use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};

use crate::domain::{PlannedRoute, leg_duration_label};

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const MARGIN_MM: f32 = 20.0;
const LINE_HEIGHT_MM: f32 = 8.0;

/// Typographic role of a summary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Heading,
    Body,
    TableRow,
}

impl LineStyle {
    fn font_size(self) -> f32 {
        match self {
            Self::Title => 16.0,
            Self::Heading | Self::Body | Self::TableRow => 12.0,
        }
    }
}

/// A single line of the summary before layout.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryLine {
    pub style: LineStyle,
    pub columns: Vec<String>,
}

impl SummaryLine {
    fn text(style: LineStyle, text: impl Into<String>) -> Self {
        Self {
            style,
            columns: vec![text.into()],
        }
    }

    fn row(columns: [String; 3]) -> Self {
        Self {
            style: LineStyle::TableRow,
            columns: columns.to_vec(),
        }
    }
}

/// Lines of the summary: title, mode, timestamp, itinerary, leg table and totals.
pub fn summary_lines(planned: &PlannedRoute, generated_at: DateTime<Utc>) -> Vec<SummaryLine> {
    let route = &planned.route;
    let waypoints = if route.waypoints.is_empty() {
        "none".to_owned()
    } else {
        route.waypoints.join(", ")
    };
    let mut lines = vec![
        SummaryLine::text(LineStyle::Title, format!("Route summary: {}", route.name)),
        SummaryLine::text(
            LineStyle::Body,
            format!(
                "Transport mode: {} (average speed: {} km/h)",
                route.mode,
                route.mode.average_speed_kmh()
            ),
        ),
        SummaryLine::text(
            LineStyle::Body,
            format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        ),
        SummaryLine::text(LineStyle::Heading, "Route:"),
        SummaryLine::text(LineStyle::Body, format!("- Origin: {}", route.origin)),
        SummaryLine::text(LineStyle::Body, format!("- Waypoints: {waypoints}")),
        SummaryLine::text(LineStyle::Body, format!("- Destination: {}", route.destination)),
        SummaryLine {
            style: LineStyle::Heading,
            columns: vec!["Leg".into(), "Distance (km)".into(), "Estimated time".into()],
        },
    ];
    lines.extend(planned.legs.iter().map(|leg| {
        SummaryLine::row([
            leg.index.to_string(),
            format!("{:.2}", leg.distance_km()),
            leg_duration_label(leg.duration_hours),
        ])
    }));
    lines.push(SummaryLine::text(LineStyle::Heading, "Totals:"));
    lines.push(SummaryLine::text(
        LineStyle::Body,
        format!("- Total distance: {:.2} km", route.distance_km),
    ));
    lines.push(SummaryLine::text(
        LineStyle::Body,
        format!(
            "- Total estimated time: {}",
            leg_duration_label(route.duration_hours)
        ),
    ));
    lines
}

/// Render the summary as PDF bytes.
///
/// # Errors
///
/// Returns an error when fonts cannot be embedded or the document cannot be
/// serialised.
pub fn render(
    planned: &PlannedRoute,
    generated_at: DateTime<Utc>,
) -> Result<Vec<u8>, printpdf::Error> {
    let title = format!("Route summary: {}", planned.route.name);
    let (doc, page, layer) = PdfDocument::new(title.as_str(), PAGE_WIDTH, PAGE_HEIGHT, "summary");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let mut cursor = Cursor {
        layer: doc.get_page(page).get_layer(layer),
        y: PAGE_HEIGHT.0 - MARGIN_MM,
    };
    for line in summary_lines(planned, generated_at) {
        if cursor.y < MARGIN_MM {
            cursor = Cursor::new_page(&doc);
        }
        let font = match line.style {
            LineStyle::Title | LineStyle::Heading => &bold,
            LineStyle::Body | LineStyle::TableRow => &regular,
        };
        cursor.write(&line, font);
    }
    doc.save_to_bytes()
}

struct Cursor {
    layer: PdfLayerReference,
    y: f32,
}

impl Cursor {
    fn new_page(doc: &PdfDocumentReference) -> Self {
        let (page, layer) = doc.add_page(PAGE_WIDTH, PAGE_HEIGHT, "summary");
        Self {
            layer: doc.get_page(page).get_layer(layer),
            y: PAGE_HEIGHT.0 - MARGIN_MM,
        }
    }

    fn write(&mut self, line: &SummaryLine, font: &IndirectFontRef) {
        const COLUMN_OFFSETS_MM: [f32; 3] = [0.0, 25.0, 80.0];
        let size = line.style.font_size();
        for (text, offset) in line.columns.iter().zip(COLUMN_OFFSETS_MM) {
            self.layer
                .use_text(text.as_str(), size, Mm(MARGIN_MM + offset), Mm(self.y), font);
        }
        self.y -= if line.style == LineStyle::Title {
            LINE_HEIGHT_MM * 1.5
        } else {
            LINE_HEIGHT_MM
        };
    }
}
