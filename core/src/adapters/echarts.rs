//! ECharts rendering back-end
//!
//! Builds an Apache ECharts option document from the request and wraps it
//! in a minimal self-contained HTML page loading the ECharts runtime from
//! a CDN. The option JSON is the real output; the HTML shell exists so
//! the artifact opens directly in a browser.
//!
//! Column conventions: the first non-numeric column provides category
//! labels (row indices are generated when absent) and every numeric
//! column becomes one series. Pie, funnel, and gauge charts read only the
//! first numeric column.

use std::collections::HashSet;
use std::time::Instant;

use serde_json::{json, Value as Json};

use crate::adapter::ChartAdapter;
use crate::chart::{ChartRequest, ChartType, Column, Dataset, ExportFormat, RenderedArtifact};
use crate::error::{RenderError, RenderResult};

const ECHARTS_CDN: &str = "https://cdn.jsdelivr.net/npm/echarts@5.4.3/dist/echarts.min.js";
const DEFAULT_WIDTH: u32 = 900;
const DEFAULT_HEIGHT: u32 = 500;

pub struct EChartsAdapter;

impl EChartsAdapter {
    pub fn new() -> Self {
        Self
    }

    fn build_option(&self, request: &ChartRequest) -> RenderResult<Json> {
        let data = &request.data;
        let config = &request.config;

        let mut option = json!({
            "tooltip": { "show": config.show_hover() },
            "legend": { "show": config.show_legend() },
        });

        if let Some(title) = &config.title {
            option["title"] = json!({ "text": title });
        }
        if let Some(palette) = &config.color_palette {
            option["color"] = json!(palette);
        }

        match request.chart_type {
            ChartType::Line | ChartType::Bar => {
                self.axis_chart(&mut option, request, data)?;
            }
            ChartType::Scatter => {
                self.scatter_chart(&mut option, data)?;
            }
            ChartType::Pie | ChartType::Funnel => {
                self.part_to_whole_chart(&mut option, request.chart_type, data)?;
            }
            ChartType::Radar => {
                self.radar_chart(&mut option, data)?;
            }
            ChartType::Gauge => {
                self.gauge_chart(&mut option, data)?;
            }
            other => {
                return Err(RenderError::UnsupportedChartType {
                    adapter: self.name().to_string(),
                    chart_type: other,
                });
            }
        }

        Ok(option)
    }

    fn axis_chart(
        &self,
        option: &mut Json,
        request: &ChartRequest,
        data: &Dataset,
    ) -> RenderResult<()> {
        let series_type = request.chart_type.as_str();
        let series: Vec<Json> = data
            .numeric_columns()
            .iter()
            .map(|col| {
                json!({
                    "name": col.name,
                    "type": series_type,
                    "data": col.numeric_values(),
                })
            })
            .collect();
        if series.is_empty() {
            return Err(self.invalid(request.chart_type, "no numeric columns to plot"));
        }

        let mut x_axis = json!({ "type": "category", "data": category_labels(data) });
        if let Some(label) = &request.config.x_label {
            x_axis["name"] = json!(label);
        }
        let mut y_axis = json!({ "type": "value" });
        if let Some(label) = &request.config.y_label {
            y_axis["name"] = json!(label);
        }

        option["xAxis"] = x_axis;
        option["yAxis"] = y_axis;
        option["series"] = json!(series);
        Ok(())
    }

    fn scatter_chart(&self, option: &mut Json, data: &Dataset) -> RenderResult<()> {
        let numeric = data.numeric_columns();
        if numeric.len() < 2 {
            return Err(self.invalid(ChartType::Scatter, "needs two numeric columns"));
        }

        let xs = numeric[0].numeric_values();
        let ys = numeric[1].numeric_values();
        let points: Vec<Json> = xs
            .iter()
            .zip(ys.iter())
            .map(|(x, y)| json!([x, y]))
            .collect();

        option["xAxis"] = json!({ "type": "value", "name": numeric[0].name });
        option["yAxis"] = json!({ "type": "value", "name": numeric[1].name });
        option["series"] = json!([{ "type": "scatter", "data": points }]);
        Ok(())
    }

    fn part_to_whole_chart(
        &self,
        option: &mut Json,
        chart_type: ChartType,
        data: &Dataset,
    ) -> RenderResult<()> {
        let values = data
            .numeric_columns()
            .first()
            .copied()
            .cloned()
            .ok_or_else(|| self.invalid(chart_type, "no numeric column for slice values"))?;
        let labels = category_labels(data);

        let slices: Vec<Json> = labels
            .iter()
            .zip(values.numeric_values())
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();

        option["series"] = json!([{
            "name": values.name,
            "type": chart_type.as_str(),
            "data": slices,
        }]);
        Ok(())
    }

    fn radar_chart(&self, option: &mut Json, data: &Dataset) -> RenderResult<()> {
        let numeric = data.numeric_columns();
        if numeric.is_empty() {
            return Err(self.invalid(ChartType::Radar, "no numeric columns to plot"));
        }

        let max = numeric
            .iter()
            .flat_map(|c| c.numeric_values())
            .fold(0.0_f64, f64::max)
            .max(1.0);

        let indicators: Vec<Json> = category_labels(data)
            .into_iter()
            .map(|name| json!({ "name": name, "max": max }))
            .collect();
        let series_data: Vec<Json> = numeric
            .iter()
            .map(|col| json!({ "name": col.name, "value": col.numeric_values() }))
            .collect();

        option["radar"] = json!({ "indicator": indicators });
        option["series"] = json!([{ "type": "radar", "data": series_data }]);
        Ok(())
    }

    fn gauge_chart(&self, option: &mut Json, data: &Dataset) -> RenderResult<()> {
        let column = data
            .numeric_columns()
            .first()
            .copied()
            .cloned()
            .ok_or_else(|| self.invalid(ChartType::Gauge, "no numeric column for gauge value"))?;
        let values = column.numeric_values();
        let current = *values
            .first()
            .ok_or_else(|| self.invalid(ChartType::Gauge, "gauge column is empty"))?;
        let max = values.iter().fold(0.0_f64, |a, &b| a.max(b)).max(100.0);

        option["series"] = json!([{
            "type": "gauge",
            "max": max,
            "data": [{ "name": column.name, "value": current }],
        }]);
        Ok(())
    }

    fn invalid(&self, chart_type: ChartType, reason: &str) -> RenderError {
        RenderError::InvalidData {
            chart_type,
            reason: reason.to_string(),
        }
    }

    fn wrap_html(&self, option: &Json, request: &ChartRequest) -> RenderResult<String> {
        let option_json =
            serde_json::to_string(option).map_err(|e| RenderError::failure(self.name(), e))?;

        let width = request.config.width_or(DEFAULT_WIDTH);
        let height = request.config.height_or(DEFAULT_HEIGHT);
        Ok(format!(
            "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
             <script src=\"{cdn}\"></script>\n</head>\n<body>\n\
             <div id=\"chart\" style=\"width:{width}px;height:{height}px;\"></div>\n\
             <script>\nvar chart = echarts.init(document.getElementById('chart'));\n\
             chart.setOption({option});\n</script>\n</body>\n</html>\n",
            cdn = ECHARTS_CDN,
            width = width,
            height = height,
            option = option_json,
        ))
    }
}

impl Default for EChartsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartAdapter for EChartsAdapter {
    fn name(&self) -> &str {
        "echarts"
    }

    fn supported_chart_types(&self) -> HashSet<ChartType> {
        [
            ChartType::Line,
            ChartType::Bar,
            ChartType::Scatter,
            ChartType::Pie,
            ChartType::Funnel,
            ChartType::Radar,
            ChartType::Gauge,
        ]
        .into_iter()
        .collect()
    }

    fn validate_data(&self, chart_type: ChartType, data: &Dataset) -> bool {
        if data.row_count() == 0 || !data.is_rectangular() {
            return false;
        }
        let numeric = data.numeric_columns().len();
        match chart_type {
            ChartType::Scatter => numeric >= 2,
            _ => numeric >= 1,
        }
    }

    fn render(
        &self,
        request: &ChartRequest,
        _deadline: Option<Instant>,
    ) -> RenderResult<RenderedArtifact> {
        let option = self.build_option(request)?;
        let html = self.wrap_html(&option, request)?;
        Ok(RenderedArtifact::new(
            html,
            ExportFormat::Html,
            request.chart_type,
            self.name(),
        ))
    }

    fn export_formats(&self) -> HashSet<ExportFormat> {
        [ExportFormat::Html, ExportFormat::Json].into_iter().collect()
    }

    fn features(&self) -> Vec<String> {
        vec![
            "interactive tooltips and zoom".to_string(),
            "wide chart type coverage".to_string(),
        ]
    }
}

/// Labels for the category axis: the first non-numeric column, or
/// generated row indices when every column is numeric.
fn category_labels(data: &Dataset) -> Vec<String> {
    if let Some(col) = label_column(data) {
        col.values.iter().map(|v| v.label()).collect()
    } else {
        (1..=data.row_count()).map(|i| i.to_string()).collect()
    }
}

fn label_column(data: &Dataset) -> Option<&Column> {
    data.columns.iter().find(|c| !c.is_numeric())
}
