//! Adapter contract for rendering back-ends
//!
//! Every rendering back-end implements [`ChartAdapter`] so the registry
//! can dispatch chart requests without back-end-specific branching. The
//! contract is stateless per call; any internal caching inside an adapter
//! is invisible to the registry.

use std::collections::HashSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::chart::{ChartRequest, ChartType, Dataset, ExportFormat, RenderedArtifact};
use crate::error::RenderResult;

/// Capability surface of a rendering back-end.
///
/// Implementations must be thread-safe: the registry dispatches renders
/// from concurrent callers without serializing them.
pub trait ChartAdapter: Send + Sync {
    /// Stable identifier, never empty; used as the registry key.
    fn name(&self) -> &str;

    /// Chart types this back-end can render.
    fn supported_chart_types(&self) -> HashSet<ChartType>;

    /// Structural check only: required columns present, minimum row
    /// count, correct value types for the requested chart type. Must not
    /// attempt to render and must return `false` (never panic) on
    /// malformed input so the registry can short-circuit cheaply.
    fn validate_data(&self, chart_type: ChartType, data: &Dataset) -> bool;

    /// Produce the chart. The input dataset is borrowed and must not be
    /// mutated. `deadline` is advisory: adapters that can check it should
    /// abandon work past it; the registry enforces it either way.
    fn render(
        &self,
        request: &ChartRequest,
        deadline: Option<Instant>,
    ) -> RenderResult<RenderedArtifact>;

    /// Output encodings this back-end can produce. Informational only.
    fn export_formats(&self) -> HashSet<ExportFormat>;

    /// Static feature highlights surfaced in recommendations.
    fn features(&self) -> Vec<String> {
        Vec::new()
    }

    /// Read-only capability summary for this adapter.
    fn descriptor(&self) -> AdapterDescriptor {
        let mut chart_types: Vec<ChartType> = self.supported_chart_types().into_iter().collect();
        chart_types.sort_by_key(|ct| ct.as_str());

        let mut export_formats: Vec<ExportFormat> = self.export_formats().into_iter().collect();
        export_formats.sort_by_key(|f| f.to_string());

        AdapterDescriptor {
            name: self.name().to_string(),
            chart_types,
            export_formats,
            features: self.features(),
        }
    }
}

/// Read-only summary of an adapter's capabilities.
///
/// Created at registration time and never mutated afterwards; chart types
/// and formats are kept sorted so listings are deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterDescriptor {
    pub name: String,
    pub chart_types: Vec<ChartType>,
    pub export_formats: Vec<ExportFormat>,
    pub features: Vec<String>,
}

impl AdapterDescriptor {
    pub fn supports(&self, chart_type: ChartType) -> bool {
        self.chart_types.contains(&chart_type)
    }
}
