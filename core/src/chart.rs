//! Data model for chart requests and rendered artifacts
//!
//! This module defines the types exchanged across the framework boundary:
//! the tabular dataset supplied by the data loader, the chart request
//! assembled by the caller, and the opaque rendered artifact handed back
//! to the UI/report layer.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chart types understood by the framework.
///
/// Individual adapters support a subset of these; the registry gates
/// dispatch on each adapter's declared set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Line,
    Bar,
    Scatter,
    Pie,
    Funnel,
    Radar,
    Gauge,
    Heatmap,
}

impl ChartType {
    /// All chart types known to the framework
    pub fn all() -> &'static [ChartType] {
        &[
            ChartType::Line,
            ChartType::Bar,
            ChartType::Scatter,
            ChartType::Pie,
            ChartType::Funnel,
            ChartType::Radar,
            ChartType::Gauge,
            ChartType::Heatmap,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Scatter => "scatter",
            ChartType::Pie => "pie",
            ChartType::Funnel => "funnel",
            ChartType::Radar => "radar",
            ChartType::Gauge => "gauge",
            ChartType::Heatmap => "heatmap",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "line" => Ok(ChartType::Line),
            "bar" => Ok(ChartType::Bar),
            "scatter" => Ok(ChartType::Scatter),
            "pie" => Ok(ChartType::Pie),
            "funnel" => Ok(ChartType::Funnel),
            "radar" => Ok(ChartType::Radar),
            "gauge" => Ok(ChartType::Gauge),
            "heatmap" => Ok(ChartType::Heatmap),
            other => Err(format!("unknown chart type: {}", other)),
        }
    }
}

/// A single cell value in a dataset column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Number(f64),
    Text(String),
    Bool(bool),
    Null,
}

impl Value {
    /// Numeric view of the value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    /// Textual label view of the value
    pub fn label(&self) -> String {
        match self {
            Value::Int(i) => i.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Null => String::new(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Number(_))
    }
}

/// A named column of values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Column built from plain numbers
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, values.into_iter().map(Value::Number).collect())
    }

    /// Column built from plain strings
    pub fn text<S: Into<String>>(
        name: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new(
            name,
            values.into_iter().map(|s| Value::Text(s.into())).collect(),
        )
    }

    /// True when every non-null value is numeric and at least one exists
    pub fn is_numeric(&self) -> bool {
        let mut seen = false;
        for v in &self.values {
            match v {
                Value::Null => {}
                v if v.is_numeric() => seen = true,
                _ => return false,
            }
        }
        seen
    }

    /// Values as f64, substituting 0.0 for nulls
    pub fn numeric_values(&self) -> Vec<f64> {
        self.values
            .iter()
            .map(|v| v.as_f64().unwrap_or(0.0))
            .collect()
    }
}

/// A rectangular tabular dataset: ordered named columns of equal length.
///
/// Supplied by the data loader boundary; borrowed by the registry and
/// adapters for the duration of one render call and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Dataset {
    pub columns: Vec<Column>,
}

impl Dataset {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Number of rows, taken from the first column
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    /// Total number of data points across all columns
    pub fn point_count(&self) -> usize {
        self.columns.iter().map(|c| c.values.len()).sum()
    }

    /// True when every column has the same length
    pub fn is_rectangular(&self) -> bool {
        let rows = self.row_count();
        self.columns.iter().all(|c| c.values.len() == rows)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name (case-sensitive)
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_columns(&self, names: &[&str]) -> bool {
        names.iter().all(|n| self.column(n).is_some())
    }

    /// Numeric values of a named column, when it exists and is numeric
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        self.column(name)
            .filter(|c| c.is_numeric())
            .map(|c| c.numeric_values())
    }

    /// Columns whose values are numeric
    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    /// New dataset containing only the named columns, in the given order.
    /// Unknown names are reported rather than silently dropped.
    pub fn project(&self, names: &[String]) -> std::result::Result<Dataset, String> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            match self.column(name) {
                Some(c) => columns.push(c.clone()),
                None => return Err(format!("column '{}' not present in dataset", name)),
            }
        }
        Ok(Dataset::new(columns))
    }
}

/// Chart configuration options.
///
/// Unknown keys supplied by the caller land in `extra` and are ignored
/// by the framework, never rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ChartConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_palette: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_legend: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_hover: Option<bool>,

    /// Unrecognized options, preserved but unused
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

impl ChartConfig {
    pub fn width_or(&self, default: u32) -> u32 {
        self.width.unwrap_or(default)
    }

    pub fn height_or(&self, default: u32) -> u32 {
        self.height.unwrap_or(default)
    }

    pub fn show_legend(&self) -> bool {
        self.show_legend.unwrap_or(true)
    }

    pub fn show_hover(&self) -> bool {
        self.show_hover.unwrap_or(true)
    }
}

/// One chart request: immutable once constructed, owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartRequest {
    pub chart_type: ChartType,
    pub data: Dataset,
    #[serde(default)]
    pub config: ChartConfig,
}

impl ChartRequest {
    pub fn new(chart_type: ChartType, data: Dataset, config: ChartConfig) -> Self {
        Self {
            chart_type,
            data,
            config,
        }
    }
}

/// Output encodings an adapter can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Html,
    Json,
    Svg,
    Png,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExportFormat::Html => "html",
            ExportFormat::Json => "json",
            ExportFormat::Svg => "svg",
            ExportFormat::Png => "png",
        };
        f.write_str(s)
    }
}

/// Per-render performance figures attached to an artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PerformanceSummary {
    /// Wall-clock render time in milliseconds
    pub render_time_ms: f64,

    /// Process RSS delta across the render, in bytes
    pub memory_usage: u64,

    /// Size of the rendered payload in bytes
    pub output_size: u64,
}

/// Metadata describing a rendered artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub chart_type: ChartType,
    pub adapter_name: String,
    pub performance: PerformanceSummary,
}

/// A rendered chart: opaque payload plus metadata.
///
/// The payload is markup (HTML/SVG) or an encoded document depending on
/// the adapter's format; downstream consumers treat it as a blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedArtifact {
    pub payload: String,
    pub format: ExportFormat,
    pub metadata: ArtifactMetadata,
}

impl RenderedArtifact {
    pub fn new(
        payload: String,
        format: ExportFormat,
        chart_type: ChartType,
        adapter_name: impl Into<String>,
    ) -> Self {
        let output_size = payload.len() as u64;
        Self {
            payload,
            format,
            metadata: ArtifactMetadata {
                chart_type,
                adapter_name: adapter_name.into(),
                performance: PerformanceSummary {
                    output_size,
                    ..Default::default()
                },
            },
        }
    }

    pub fn output_size(&self) -> u64 {
        self.payload.len() as u64
    }
}

/// Inbound chart-intent suggestion from the analysis collaborator.
///
/// Consumed as a `ChartRequest` once `needed` is true and the suggested
/// columns are validated against the dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartIntent {
    pub needed: bool,
    pub chart_type: ChartType,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ChartIntent {
    /// Turn the suggestion into a concrete request against `dataset`.
    ///
    /// Returns `None` when the suggestion says no chart is needed, and an
    /// error string when a suggested column does not exist.
    pub fn into_request(self, dataset: &Dataset) -> std::result::Result<Option<ChartRequest>, String> {
        if !self.needed {
            return Ok(None);
        }

        let data = if self.columns.is_empty() {
            dataset.clone()
        } else {
            dataset.project(&self.columns)?
        };

        let config = ChartConfig {
            title: self.title,
            ..Default::default()
        };

        Ok(Some(ChartRequest::new(self.chart_type, data, config)))
    }
}
