//! Dependency-free SVG rendering back-end
//!
//! Produces static SVG markup with no external runtime, trading
//! interactivity for a small output and fast renders. Geometry is plain
//! scaled coordinates; no axis ticks beyond a baseline and no animation.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::time::Instant;

use crate::adapter::ChartAdapter;
use crate::chart::{ChartRequest, ChartType, Column, Dataset, ExportFormat, RenderedArtifact};
use crate::error::{RenderError, RenderResult};

const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 400;
const MARGIN: f64 = 40.0;

const PALETTE: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948",
];

pub struct SvgAdapter;

struct PlotArea {
    width: f64,
    height: f64,
}

impl PlotArea {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width: width as f64,
            height: height as f64,
        }
    }

    fn x(&self, fraction: f64) -> f64 {
        MARGIN + fraction * (self.width - 2.0 * MARGIN)
    }

    /// SVG y grows downward; flip so larger values sit higher
    fn y(&self, fraction: f64) -> f64 {
        self.height - MARGIN - fraction * (self.height - 2.0 * MARGIN)
    }
}

impl SvgAdapter {
    pub fn new() -> Self {
        Self
    }

    fn render_body(&self, request: &ChartRequest, area: &PlotArea) -> RenderResult<String> {
        match request.chart_type {
            ChartType::Line => self.line_body(&request.data, area),
            ChartType::Bar => self.bar_body(&request.data, area),
            ChartType::Scatter => self.scatter_body(&request.data, area),
            ChartType::Pie => self.pie_body(&request.data, area),
            other => Err(RenderError::UnsupportedChartType {
                adapter: self.name().to_string(),
                chart_type: other,
            }),
        }
    }

    fn line_body(&self, data: &Dataset, area: &PlotArea) -> RenderResult<String> {
        let series = self.numeric_series(data, ChartType::Line)?;
        let (min, max) = value_range(&series);

        let mut body = String::new();
        for (i, col) in series.iter().enumerate() {
            let values = col.numeric_values();
            let points: Vec<String> = values
                .iter()
                .enumerate()
                .map(|(j, v)| {
                    let fx = position_fraction(j, values.len());
                    format!("{:.1},{:.1}", area.x(fx), area.y(normalize(*v, min, max)))
                })
                .collect();
            let _ = writeln!(
                body,
                "  <polyline fill=\"none\" stroke=\"{}\" stroke-width=\"2\" points=\"{}\"/>",
                color(i),
                points.join(" ")
            );
        }
        Ok(body)
    }

    fn bar_body(&self, data: &Dataset, area: &PlotArea) -> RenderResult<String> {
        let series = self.numeric_series(data, ChartType::Bar)?;
        let (min, max) = value_range(&series);
        let rows = data.row_count();
        let group_width = (area.width - 2.0 * MARGIN) / rows as f64;
        let bar_width = (group_width * 0.8) / series.len() as f64;

        let mut body = String::new();
        for (i, col) in series.iter().enumerate() {
            for (j, v) in col.numeric_values().iter().enumerate() {
                let x = MARGIN + j as f64 * group_width + i as f64 * bar_width;
                let top = area.y(normalize(*v, min, max));
                let base = area.y(0.0);
                let _ = writeln!(
                    body,
                    "  <rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\"/>",
                    x,
                    top.min(base),
                    bar_width,
                    (base - top).abs(),
                    color(i)
                );
            }
        }
        Ok(body)
    }

    fn scatter_body(&self, data: &Dataset, area: &PlotArea) -> RenderResult<String> {
        let numeric = data.numeric_columns();
        if numeric.len() < 2 {
            return Err(RenderError::InvalidData {
                chart_type: ChartType::Scatter,
                reason: "needs two numeric columns".to_string(),
            });
        }
        let xs = numeric[0].numeric_values();
        let ys = numeric[1].numeric_values();
        let (x_min, x_max) = slice_range(&xs);
        let (y_min, y_max) = slice_range(&ys);

        let mut body = String::new();
        for (x, y) in xs.iter().zip(ys.iter()) {
            let _ = writeln!(
                body,
                "  <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"4\" fill=\"{}\"/>",
                area.x(normalize(*x, x_min, x_max)),
                area.y(normalize(*y, y_min, y_max)),
                color(0)
            );
        }
        Ok(body)
    }

    fn pie_body(&self, data: &Dataset, area: &PlotArea) -> RenderResult<String> {
        let values = data
            .numeric_columns()
            .first()
            .map(|c| c.numeric_values())
            .ok_or_else(|| RenderError::InvalidData {
                chart_type: ChartType::Pie,
                reason: "no numeric column for slice values".to_string(),
            })?;
        let total: f64 = values.iter().filter(|v| **v > 0.0).sum();
        if total <= 0.0 {
            return Err(RenderError::InvalidData {
                chart_type: ChartType::Pie,
                reason: "slice values sum to zero".to_string(),
            });
        }

        let cx = area.width / 2.0;
        let cy = area.height / 2.0;
        let radius = (area.width.min(area.height) / 2.0) - MARGIN;

        let mut body = String::new();
        let mut angle = -std::f64::consts::FRAC_PI_2;
        for (i, v) in values.iter().filter(|v| **v > 0.0).enumerate() {
            let sweep = v / total * std::f64::consts::TAU;
            let end = angle + sweep;
            let (x1, y1) = (cx + radius * angle.cos(), cy + radius * angle.sin());
            let (x2, y2) = (cx + radius * end.cos(), cy + radius * end.sin());
            let large_arc = if sweep > std::f64::consts::PI { 1 } else { 0 };
            let _ = writeln!(
                body,
                "  <path d=\"M {cx:.1} {cy:.1} L {x1:.1} {y1:.1} A {r:.1} {r:.1} 0 {large} 1 {x2:.1} {y2:.1} Z\" fill=\"{fill}\"/>",
                cx = cx,
                cy = cy,
                x1 = x1,
                y1 = y1,
                r = radius,
                large = large_arc,
                x2 = x2,
                y2 = y2,
                fill = color(i)
            );
            angle = end;
        }
        Ok(body)
    }

    fn numeric_series<'a>(
        &self,
        data: &'a Dataset,
        chart_type: ChartType,
    ) -> RenderResult<Vec<&'a Column>> {
        let series = data.numeric_columns();
        if series.is_empty() {
            return Err(RenderError::InvalidData {
                chart_type,
                reason: "no numeric columns to plot".to_string(),
            });
        }
        Ok(series)
    }
}

impl Default for SvgAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartAdapter for SvgAdapter {
    fn name(&self) -> &str {
        "svg"
    }

    fn supported_chart_types(&self) -> HashSet<ChartType> {
        [
            ChartType::Line,
            ChartType::Bar,
            ChartType::Scatter,
            ChartType::Pie,
        ]
        .into_iter()
        .collect()
    }

    fn validate_data(&self, chart_type: ChartType, data: &Dataset) -> bool {
        if data.row_count() == 0 || !data.is_rectangular() {
            return false;
        }
        let numeric = data.numeric_columns();
        match chart_type {
            ChartType::Scatter => numeric.len() >= 2,
            ChartType::Pie => numeric
                .first()
                .map(|c| c.numeric_values().iter().any(|v| *v > 0.0))
                .unwrap_or(false),
            _ => !numeric.is_empty(),
        }
    }

    fn render(
        &self,
        request: &ChartRequest,
        _deadline: Option<Instant>,
    ) -> RenderResult<RenderedArtifact> {
        let width = request.config.width_or(DEFAULT_WIDTH);
        let height = request.config.height_or(DEFAULT_HEIGHT);
        let area = PlotArea::new(width, height);

        let body = self.render_body(request, &area)?;

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
            w = width,
            h = height
        );
        if let Some(title) = &request.config.title {
            let _ = writeln!(
                svg,
                "  <text x=\"{:.1}\" y=\"24\" text-anchor=\"middle\" font-size=\"16\">{}</text>",
                width as f64 / 2.0,
                escape_text(title)
            );
        }
        svg.push_str(&body);
        svg.push_str("</svg>\n");

        Ok(RenderedArtifact::new(
            svg,
            ExportFormat::Svg,
            request.chart_type,
            self.name(),
        ))
    }

    fn export_formats(&self) -> HashSet<ExportFormat> {
        [ExportFormat::Svg].into_iter().collect()
    }

    fn features(&self) -> Vec<String> {
        vec![
            "no external runtime".to_string(),
            "small static output".to_string(),
        ]
    }
}

fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

/// Value scaled to 0..1 within its range; degenerate ranges center
fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if (max - min).abs() <= f64::EPSILON {
        0.5
    } else {
        (value - min) / (max - min)
    }
}

fn position_fraction(index: usize, len: usize) -> f64 {
    if len <= 1 {
        0.5
    } else {
        index as f64 / (len - 1) as f64
    }
}

fn value_range(series: &[&Column]) -> (f64, f64) {
    let values: Vec<f64> = series.iter().flat_map(|c| c.numeric_values()).collect();
    slice_range(&values)
}

fn slice_range(values: &[f64]) -> (f64, f64) {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min.is_finite() {
        // Anchor bar baselines at zero for all-positive data.
        (min.min(0.0), max)
    } else {
        (0.0, 1.0)
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}
