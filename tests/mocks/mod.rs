//! Mock adapters and dataset generators for integration tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use multiviz_core::{
    ChartAdapter, ChartRequest, ChartType, Dataset, ExportFormat, RenderError, RenderedArtifact,
};

/// Configurable adapter for exercising registry and monitor behavior.
///
/// Latency, failure mode, and payload size are all settable so tests can
/// shape the telemetry an adapter produces.
pub struct MockAdapter {
    name: String,
    chart_types: HashSet<ChartType>,
    delay: Option<Duration>,
    fail_with: Option<String>,
    payload_bytes: usize,
    features: Vec<String>,
    render_count: AtomicUsize,
}

impl MockAdapter {
    pub fn new(name: &str, chart_types: &[ChartType]) -> Self {
        Self {
            name: name.to_string(),
            chart_types: chart_types.iter().copied().collect(),
            delay: None,
            fail_with: None,
            payload_bytes: 256,
            features: Vec::new(),
            render_count: AtomicUsize::new(0),
        }
    }

    /// Sleep this long inside every render call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail every render with this message
    pub fn with_failure(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    pub fn with_payload_bytes(mut self, bytes: usize) -> Self {
        self.payload_bytes = bytes;
        self
    }

    pub fn with_features(mut self, features: &[&str]) -> Self {
        self.features = features.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Number of render calls that reached this adapter
    pub fn render_count(&self) -> usize {
        self.render_count.load(Ordering::SeqCst)
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl ChartAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn supported_chart_types(&self) -> HashSet<ChartType> {
        self.chart_types.clone()
    }

    fn validate_data(&self, _chart_type: ChartType, data: &Dataset) -> bool {
        data.row_count() > 0
    }

    fn render(
        &self,
        request: &ChartRequest,
        _deadline: Option<Instant>,
    ) -> Result<RenderedArtifact, RenderError> {
        self.render_count.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(message) = &self.fail_with {
            return Err(RenderError::failure_msg(&self.name, message.clone()));
        }

        Ok(RenderedArtifact::new(
            "x".repeat(self.payload_bytes),
            ExportFormat::Html,
            request.chart_type,
            self.name(),
        ))
    }

    fn export_formats(&self) -> HashSet<ExportFormat> {
        [ExportFormat::Html].into_iter().collect()
    }

    fn features(&self) -> Vec<String> {
        self.features.clone()
    }
}

/// Dataset generators shared across integration tests
pub mod datasets {
    use multiviz_core::{Column, Dataset};
    use rand::{Rng, SeedableRng};

    /// Small fixed dataset with a label column and two numeric series
    pub fn sales() -> Dataset {
        Dataset::new(vec![
            Column::text("month", ["Jan", "Feb", "Mar", "Apr"]),
            Column::numeric("sales", [120.0, 135.5, 98.0, 160.25]),
            Column::numeric("cost", [60.0, 72.5, 55.0, 81.0]),
        ])
    }

    /// Seeded pseudo-random numeric dataset of the given size
    pub fn random_numeric(rows: usize, seed: u64) -> Dataset {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let labels: Vec<String> = (0..rows).map(|i| format!("row-{}", i)).collect();
        let values: Vec<f64> = (0..rows).map(|_| rng.gen_range(0.0..1000.0)).collect();
        Dataset::new(vec![
            Column::text("label", labels),
            Column::numeric("value", values),
        ])
    }
}
