//! Error distribution bar chart.
//!
//! The chart is laid out as SVG and rasterized to PNG with resvg.

use crate::checker::CheckMatch;
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::{debug, warn};
use usvg::fontdb;

/// Chart width in pixels.
pub const CHART_WIDTH: u32 = 800;

/// Chart height in pixels.
pub const CHART_HEIGHT: u32 = 500;

const TITLE: &str = "Распределение типов ошибок";
const X_LABEL: &str = "Тип ошибки";
const Y_LABEL: &str = "Количество";
const FONT_FAMILY: &str = "DejaVu Sans";

/// DejaVu Sans, shipped with the crate so labels render on hosts without fonts.
const BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");

// Plot area margins
const MARGIN_LEFT: f64 = 80.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 60.0;
const MARGIN_BOTTOM: f64 = 70.0;

/// Fraction of each category slot covered by its bar.
const BAR_FILL: f64 = 0.8;

/// Fill color used for categories without an assigned color.
const FALLBACK_COLOR: &str = "gray";

lazy_static! {
    /// Bundled font plus system fonts, loaded once on first render.
    static ref FONT_DB: Arc<fontdb::Database> = {
        let mut db = bundled_font_db();
        db.load_system_fonts();
        debug!("Loaded {} font faces for chart rendering", db.len());
        Arc::new(db)
    };
}

/// Font database holding only the bundled DejaVu Sans face.
fn bundled_font_db() -> fontdb::Database {
    let mut db = fontdb::Database::new();
    db.load_font_data(BUNDLED_FONT.to_vec());
    if db.is_empty() {
        warn!("Bundled chart font could not be loaded; chart labels will be missing");
    }
    db
}

/// Bar color for an issue category.
///
/// `misspelling`, the category LanguageTool uses for spelling errors, shares
/// the `spelling` color.
pub fn category_color(issue_type: &str) -> &'static str {
    match issue_type {
        "grammar" => "red",
        "typographical" => "blue",
        "spelling" | "misspelling" => "green",
        "style" => "orange",
        _ => FALLBACK_COLOR,
    }
}

/// Counts matches per issue category, in order of first appearance.
pub fn count_by_issue_type(matches: &[CheckMatch]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for m in matches {
        match counts.iter_mut().find(|(category, _)| *category == m.issue_type) {
            Some(entry) => entry.1 += 1,
            None => counts.push((m.issue_type.clone(), 1)),
        }
    }
    counts
}

/// Renders the error distribution of `matches` as PNG bytes.
///
/// Callers handle the empty case themselves; an empty slice renders axes only.
pub fn render_error_chart(matches: &[CheckMatch]) -> Result<Vec<u8>> {
    let counts = count_by_issue_type(matches);
    let svg = build_chart_svg(&counts);
    rasterize(&svg)
}

/// Lays out the bar chart for `counts` as an SVG document.
fn build_chart_svg(counts: &[(String, usize)]) -> String {
    let width = CHART_WIDTH as f64;
    let height = CHART_HEIGHT as f64;
    let plot_width = width - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_height = height - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_height;

    let max_count = counts.iter().map(|(_, n)| *n).max().unwrap_or(0).max(1);
    // Leave headroom above the tallest bar for its label
    let y_scale = plot_height / (max_count as f64 * 1.1);
    let tick_step = max_count.div_ceil(5).max(1);

    let mut svg = String::new();
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="{font}">"#,
        w = CHART_WIDTH,
        h = CHART_HEIGHT,
        font = FONT_FAMILY,
    );
    let _ = write!(svg, r#"<rect width="{}" height="{}" fill="white"/>"#, width, height);

    // Title and axis labels
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="18" text-anchor="middle">{}</text>"#,
        width / 2.0,
        MARGIN_TOP / 2.0 + 6.0,
        escape_xml(TITLE)
    );
    let _ = write!(
        svg,
        r#"<text x="{:.1}" y="{:.1}" font-size="14" text-anchor="middle">{}</text>"#,
        MARGIN_LEFT + plot_width / 2.0,
        height - 15.0,
        escape_xml(X_LABEL)
    );
    let _ = write!(
        svg,
        r#"<text x="20" y="{y:.1}" font-size="14" text-anchor="middle" transform="rotate(-90 20 {y:.1})">{label}</text>"#,
        y = MARGIN_TOP + plot_height / 2.0,
        label = escape_xml(Y_LABEL)
    );

    // Y axis ticks
    let mut tick = 0;
    while tick <= max_count {
        let y = baseline - tick as f64 * y_scale;
        let _ = write!(
            svg,
            r#"<line x1="{x1:.1}" y1="{y:.1}" x2="{x2:.1}" y2="{y:.1}" stroke="black"/><text x="{tx:.1}" y="{ty:.1}" font-size="12" text-anchor="end">{tick}</text>"#,
            x1 = MARGIN_LEFT - 5.0,
            x2 = MARGIN_LEFT,
            tx = MARGIN_LEFT - 8.0,
            ty = y + 4.0,
        );
        tick += tick_step;
    }

    // Bars with their count on top and category underneath
    if !counts.is_empty() {
        let slot = plot_width / counts.len() as f64;
        let bar_width = slot * BAR_FILL;
        for (index, (category, count)) in counts.iter().enumerate() {
            let center = MARGIN_LEFT + slot * (index as f64 + 0.5);
            let bar_height = *count as f64 * y_scale;
            let top = baseline - bar_height;
            let _ = write!(
                svg,
                r#"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{}"/>"#,
                center - bar_width / 2.0,
                top,
                bar_width,
                bar_height,
                category_color(category)
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="13" text-anchor="middle">{}</text>"#,
                center,
                top - 5.0,
                count
            );
            let _ = write!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="13" text-anchor="middle">{}</text>"#,
                center,
                baseline + 20.0,
                escape_xml(category)
            );
        }
    }

    // Axes
    let _ = write!(
        svg,
        r#"<line x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}" stroke="black"/><line x1="{l:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="black"/>"#,
        l = MARGIN_LEFT,
        t = MARGIN_TOP,
        b = baseline,
        r = width - MARGIN_RIGHT,
    );

    svg.push_str("</svg>");
    svg
}

/// Rasterizes an SVG document to PNG bytes.
fn rasterize(svg: &str) -> Result<Vec<u8>> {
    let options = usvg::Options {
        fontdb: Arc::clone(&FONT_DB),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(svg, &options).context("Failed to parse chart SVG")?;

    let mut pixmap = tiny_skia::Pixmap::new(CHART_WIDTH, CHART_HEIGHT)
        .context("Failed to allocate chart pixmap")?;
    pixmap.fill(tiny_skia::Color::WHITE);
    resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());

    pixmap.encode_png().context("Failed to encode chart as PNG")
}

/// Escapes text for use inside SVG markup.
fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn issue(issue_type: &str) -> CheckMatch {
        CheckMatch {
            offset: 0,
            error_length: 1,
            issue_type: issue_type.to_string(),
            message: String::new(),
            replacements: Vec::new(),
        }
    }

    #[test]
    fn test_count_by_issue_type_first_seen_order() {
        let matches = vec![
            issue("style"),
            issue("grammar"),
            issue("style"),
            issue("misspelling"),
            issue("grammar"),
            issue("style"),
        ];

        assert_eq!(
            count_by_issue_type(&matches),
            vec![
                ("style".to_string(), 3),
                ("grammar".to_string(), 2),
                ("misspelling".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_category_colors() {
        assert_eq!(category_color("grammar"), "red");
        assert_eq!(category_color("typographical"), "blue");
        assert_eq!(category_color("spelling"), "green");
        assert_eq!(category_color("misspelling"), "green");
        assert_eq!(category_color("style"), "orange");
        assert_eq!(category_color("whitespace"), "gray");
    }

    #[test]
    fn test_svg_has_one_bar_per_category() {
        let counts = vec![("grammar".to_string(), 2), ("uncategorized".to_string(), 1)];
        let svg = build_chart_svg(&counts);

        assert!(svg.contains(TITLE));
        assert!(svg.contains(X_LABEL));
        assert!(svg.contains(Y_LABEL));
        assert_eq!(svg.matches(r#"fill="red""#).count(), 1);
        assert_eq!(svg.matches(r#"fill="gray""#).count(), 1);
        assert!(svg.contains(">uncategorized</text>"));
        // Count labels above the bars
        assert!(svg.contains(">2</text>"));
        assert!(svg.contains(">1</text>"));
    }

    fn count_text_nodes(group: &usvg::Group) -> usize {
        group
            .children()
            .iter()
            .map(|node| match node {
                usvg::Node::Text(_) => 1,
                usvg::Node::Group(child) => count_text_nodes(child),
                _ => 0,
            })
            .sum()
    }

    #[test]
    fn test_bundled_font_keeps_chart_text() {
        let db = bundled_font_db();
        assert!(!db.is_empty());

        let svg = build_chart_svg(&[("grammar".to_string(), 2)]);
        let options = usvg::Options {
            fontdb: Arc::new(db),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &options).unwrap();

        // Title, two axis labels, y ticks 0..=2, count label and category label
        assert_eq!(count_text_nodes(tree.root()), 8);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & \"c\""), "a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_render_error_chart_produces_png() {
        let matches = vec![issue("grammar"), issue("style"), issue("grammar")];
        let png = render_error_chart(&matches).unwrap();
        assert!(png.starts_with(PNG_SIGNATURE));
    }
}
