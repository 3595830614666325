//! Recommendation engine for adapter selection
//!
//! Turns accumulated render telemetry into a ranked, justified suggestion
//! of which adapter to use for a chart type. Scores combine render time,
//! memory usage, and output size under configurable weights; adapters
//! without telemetry receive a neutral baseline score so they stay
//! eligible before they accumulate history.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter::AdapterDescriptor;
use crate::chart::ChartType;
use crate::config::{ScoreWeights, ScoringConfig};
use crate::monitor::{AggregatedStats, PerformanceMonitor};
use crate::registry::AdapterRegistry;

/// A scored, justified suggestion of which adapter to use
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub adapter: String,

    /// Bounded score, 0-10, higher is better
    pub score: f64,

    /// Short human-readable justification strings
    pub reasons: Vec<String>,
}

/// Single-metric selection criterion for [`RecommendationEngine::best_for`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Lowest mean render time
    Speed,
    /// Lowest mean memory delta
    Memory,
    /// Smallest mean output size
    Footprint,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Criterion::Speed => "speed",
            Criterion::Memory => "memory",
            Criterion::Footprint => "footprint",
        };
        f.write_str(s)
    }
}

impl FromStr for Criterion {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "speed" => Ok(Criterion::Speed),
            "memory" => Ok(Criterion::Memory),
            "footprint" => Ok(Criterion::Footprint),
            other => Err(format!("unknown criterion: {}", other)),
        }
    }
}

/// Scores adapters for a chart type from registry capabilities and
/// monitor statistics. Produces fresh results on every call; nothing is
/// persisted.
pub struct RecommendationEngine {
    registry: Arc<AdapterRegistry>,
    monitor: Arc<PerformanceMonitor>,
    config: ScoringConfig,
}

struct Candidate {
    descriptor: AdapterDescriptor,
    stats: Option<AggregatedStats>,
}

impl RecommendationEngine {
    pub fn new(registry: Arc<AdapterRegistry>, config: ScoringConfig) -> Self {
        let monitor = Arc::clone(registry.monitor());
        Self {
            registry,
            monitor,
            config,
        }
    }

    /// Ranked recommendations using the configured weights
    pub fn recommend(&self, chart_type: ChartType) -> Vec<Recommendation> {
        self.recommend_with_weights(chart_type, &self.config.weights)
    }

    /// Ranked recommendations for a chart type.
    ///
    /// Returns an empty list (not an error) when no registered adapter
    /// supports the chart type. Ordering is deterministic for a fixed
    /// monitor snapshot: stable sort descending by score, ties broken by
    /// adapter name.
    pub fn recommend_with_weights(
        &self,
        chart_type: ChartType,
        weights: &ScoreWeights,
    ) -> Vec<Recommendation> {
        let candidates = self.candidates(chart_type);
        if candidates.is_empty() {
            debug!(chart_type = %chart_type, "no adapters support chart type");
            return Vec::new();
        }

        // Normalization baselines: the best observed mean among candidates
        // that have at least one successful render.
        let best_time = best_metric(&candidates, |s| s.mean_render_time_ms);
        let best_memory = best_metric(&candidates, |s| s.mean_memory_bytes);
        let best_output = best_metric(&candidates, |s| s.mean_output_bytes);

        let mut recommendations: Vec<Recommendation> = candidates
            .iter()
            .map(|candidate| {
                let (score, reasons) = match &candidate.stats {
                    Some(stats) => {
                        let score =
                            self.weighted_score(stats, weights, best_time, best_memory, best_output);
                        (score, self.reasons_from_stats(stats, &candidate.descriptor))
                    }
                    None => (
                        self.config.baseline_score,
                        self.reasons_for_untested(&candidate.descriptor),
                    ),
                };
                Recommendation {
                    adapter: candidate.descriptor.name.clone(),
                    score: (score * 10.0).round() / 10.0,
                    reasons,
                }
            })
            .collect();

        // Candidates arrive name-sorted; a stable sort on score keeps the
        // name order as the tie-break.
        recommendations.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        recommendations
    }

    /// Single-metric selection, independent of the weighted scorer.
    ///
    /// Only adapters with recorded successful telemetry are considered;
    /// returns `None` when no such adapter supports the chart type.
    pub fn best_for(&self, chart_type: ChartType, criterion: Criterion) -> Option<String> {
        let metric = |stats: &AggregatedStats| match criterion {
            Criterion::Speed => stats.mean_render_time_ms,
            Criterion::Memory => stats.mean_memory_bytes,
            Criterion::Footprint => stats.mean_output_bytes,
        };

        self.candidates(chart_type)
            .into_iter()
            .filter_map(|c| {
                let stats = c.stats?;
                if stats.success_count == 0 {
                    return None;
                }
                Some((c.descriptor.name, metric(&stats)))
            })
            // Candidates are name-sorted, so strict less-than keeps the
            // first name on ties.
            .fold(None, |best: Option<(String, f64)>, (name, value)| match best {
                Some((_, best_value)) if value >= best_value => best,
                _ => Some((name, value)),
            })
            .map(|(name, _)| name)
    }

    /// Supporting adapters with their best-scoped statistics, name-sorted.
    ///
    /// Stats are scoped to (adapter, chart type) when such telemetry
    /// exists, falling back to adapter-wide stats, falling back to none.
    fn candidates(&self, chart_type: ChartType) -> Vec<Candidate> {
        self.registry
            .list_adapters()
            .into_iter()
            .filter(|d| d.supports(chart_type))
            .map(|descriptor| {
                let scoped = self.monitor.aggregate(&descriptor.name, Some(chart_type));
                let stats = if !scoped.is_empty() {
                    Some(scoped)
                } else {
                    let adapter_wide = self.monitor.aggregate(&descriptor.name, None);
                    (!adapter_wide.is_empty()).then_some(adapter_wide)
                };
                Candidate { descriptor, stats }
            })
            .collect()
    }

    fn weighted_score(
        &self,
        stats: &AggregatedStats,
        weights: &ScoreWeights,
        best_time: Option<f64>,
        best_memory: Option<f64>,
        best_output: Option<f64>,
    ) -> f64 {
        let total = weights.total();
        if total <= 0.0 {
            // Degenerate weights carry no preference; score neutrally
            // rather than dividing by zero.
            return self.config.baseline_score.clamp(0.0, 10.0);
        }

        let time_ratio = normalized_ratio(best_time, stats.mean_render_time_ms);
        let memory_ratio = normalized_ratio(best_memory, stats.mean_memory_bytes);
        let output_ratio = normalized_ratio(best_output, stats.mean_output_bytes);
        let combined = (weights.render_time * time_ratio
            + weights.memory * memory_ratio
            + weights.output_size * output_ratio)
            / total;

        // Unreliable adapters rank down in proportion to their failures.
        (10.0 * combined * stats.success_rate()).clamp(0.0, 10.0)
    }

    fn reasons_from_stats(
        &self,
        stats: &AggregatedStats,
        descriptor: &AdapterDescriptor,
    ) -> Vec<String> {
        let mut reasons = Vec::new();

        if stats.success_count > 0 {
            if stats.mean_render_time_ms < self.config.fast_render_ms {
                reasons.push(format!(
                    "renders in under {:.0}ms on average",
                    self.config.fast_render_ms
                ));
            }
            if stats.mean_output_bytes < self.config.compact_output_bytes as f64 {
                reasons.push("produces compact output".to_string());
            }
            if stats.mean_memory_bytes < self.config.low_memory_bytes as f64 {
                reasons.push("low memory footprint".to_string());
            }
        }
        if stats.success_rate() < 1.0 {
            reasons.push(format!(
                "{:.0}% success rate over {} renders",
                stats.success_rate() * 100.0,
                stats.count
            ));
        }

        reasons.extend(descriptor.features.iter().cloned());
        reasons.truncate(self.config.max_reasons);
        reasons
    }

    fn reasons_for_untested(&self, descriptor: &AdapterDescriptor) -> Vec<String> {
        let mut reasons = vec!["no recorded telemetry yet".to_string()];
        reasons.extend(descriptor.features.iter().cloned());
        reasons.truncate(self.config.max_reasons);
        reasons
    }
}

/// Best-mean over per-adapter mean, as a 0-1 ratio. The +1 smoothing
/// keeps zero-valued means (e.g. unmeasurable memory deltas) from
/// producing degenerate ratios.
fn normalized_ratio(best: Option<f64>, value: f64) -> f64 {
    match best {
        Some(best) => ((best + 1.0) / (value + 1.0)).clamp(0.0, 1.0),
        None => 1.0,
    }
}

fn best_metric(candidates: &[Candidate], metric: impl Fn(&AggregatedStats) -> f64) -> Option<f64> {
    candidates
        .iter()
        .filter_map(|c| c.stats.as_ref())
        .filter(|s| s.success_count > 0)
        .map(metric)
        .fold(None, |best, value| match best {
            Some(b) if b <= value => Some(b),
            _ => Some(value),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::ChartAdapter;
    use crate::chart::{ChartRequest, Dataset, ExportFormat, RenderedArtifact};
    use crate::error::RenderResult;
    use crate::monitor::RenderOutcome;
    use std::collections::HashSet;
    use std::time::Duration;

    struct NamedAdapter {
        name: String,
        chart_types: HashSet<ChartType>,
        features: Vec<String>,
    }

    impl NamedAdapter {
        fn new(name: &str, chart_types: &[ChartType]) -> Self {
            Self {
                name: name.to_string(),
                chart_types: chart_types.iter().copied().collect(),
                features: Vec::new(),
            }
        }

        fn with_features(mut self, features: &[&str]) -> Self {
            self.features = features.iter().map(|s| s.to_string()).collect();
            self
        }
    }

    impl ChartAdapter for NamedAdapter {
        fn name(&self) -> &str {
            &self.name
        }

        fn supported_chart_types(&self) -> HashSet<ChartType> {
            self.chart_types.clone()
        }

        fn validate_data(&self, _chart_type: ChartType, _data: &Dataset) -> bool {
            true
        }

        fn render(
            &self,
            request: &ChartRequest,
            _deadline: Option<std::time::Instant>,
        ) -> RenderResult<RenderedArtifact> {
            Ok(RenderedArtifact::new(
                "ok".to_string(),
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

    fn engine_with(adapters: Vec<NamedAdapter>) -> RecommendationEngine {
        let registry = Arc::new(AdapterRegistry::new(Arc::new(
            PerformanceMonitor::default(),
        )));
        for adapter in adapters {
            registry.register(Arc::new(adapter)).unwrap();
        }
        RecommendationEngine::new(registry, ScoringConfig::default())
    }

    fn record_renders(
        engine: &RecommendationEngine,
        adapter: &str,
        chart_type: ChartType,
        count: usize,
        ms: u64,
    ) {
        for _ in 0..count {
            engine.monitor.record(RenderOutcome::success(
                adapter,
                chart_type,
                100,
                Duration::from_millis(ms),
                1024,
                2048,
            ));
        }
    }

    #[test]
    fn test_faster_adapter_ranks_first() {
        let engine = engine_with(vec![
            NamedAdapter::new("fast", &[ChartType::Line, ChartType::Bar]),
            NamedAdapter::new("rich", &[ChartType::Line, ChartType::Pie]),
        ]);
        record_renders(&engine, "fast", ChartType::Line, 5, 50);
        record_renders(&engine, "rich", ChartType::Line, 5, 200);

        let recs = engine.recommend(ChartType::Line);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].adapter, "fast");
        assert_eq!(recs[1].adapter, "rich");
        assert!(recs[0].score > recs[1].score);

        let pie = engine.recommend(ChartType::Pie);
        assert_eq!(pie.len(), 1);
        assert_eq!(pie[0].adapter, "rich");
    }

    #[test]
    fn test_no_supporting_adapter_returns_empty() {
        let engine = engine_with(vec![NamedAdapter::new("fast", &[ChartType::Line])]);
        assert!(engine.recommend(ChartType::Gauge).is_empty());
    }

    #[test]
    fn test_untested_adapter_gets_neutral_baseline() {
        let engine = engine_with(vec![
            NamedAdapter::new("untested", &[ChartType::Line]).with_features(&["gpu accelerated"]),
        ]);

        let recs = engine.recommend(ChartType::Line);
        assert_eq!(recs.len(), 1);
        assert!((recs[0].score - 5.0).abs() < 1e-9);
        assert_eq!(recs[0].reasons[0], "no recorded telemetry yet");
        assert!(recs[0].reasons.contains(&"gpu accelerated".to_string()));
    }

    #[test]
    fn test_ordering_is_deterministic_with_ties() {
        let engine = engine_with(vec![
            NamedAdapter::new("zeta", &[ChartType::Line]),
            NamedAdapter::new("alpha", &[ChartType::Line]),
        ]);

        // Both untested: identical baseline scores, tie broken by name.
        let first = engine.recommend(ChartType::Line);
        let second = engine.recommend(ChartType::Line);
        assert_eq!(first, second);
        assert_eq!(first[0].adapter, "alpha");
        assert_eq!(first[1].adapter, "zeta");
    }

    #[test]
    fn test_failures_down_weight_score() {
        let engine = engine_with(vec![
            NamedAdapter::new("flaky", &[ChartType::Line]),
            NamedAdapter::new("solid", &[ChartType::Line]),
        ]);
        record_renders(&engine, "solid", ChartType::Line, 4, 100);
        record_renders(&engine, "flaky", ChartType::Line, 2, 100);
        for _ in 0..2 {
            engine.monitor.record(RenderOutcome::failure(
                "flaky",
                ChartType::Line,
                100,
                Duration::from_millis(100),
                0,
                "boom",
            ));
        }

        let recs = engine.recommend(ChartType::Line);
        assert_eq!(recs[0].adapter, "solid");
        assert!(recs[1].score < recs[0].score);
        assert!(recs[1]
            .reasons
            .iter()
            .any(|r| r.contains("50% success rate")));
    }

    #[test]
    fn test_chart_type_scoped_stats_preferred_over_adapter_wide() {
        let engine = engine_with(vec![
            NamedAdapter::new("a", &[ChartType::Line, ChartType::Bar]),
            NamedAdapter::new("b", &[ChartType::Line]),
        ]);
        // "a" is slow in general but fast on line charts specifically.
        record_renders(&engine, "a", ChartType::Bar, 5, 500);
        record_renders(&engine, "a", ChartType::Line, 5, 20);
        record_renders(&engine, "b", ChartType::Line, 5, 100);

        let recs = engine.recommend(ChartType::Line);
        assert_eq!(recs[0].adapter, "a");
    }

    #[test]
    fn test_best_for_criteria() {
        let engine = engine_with(vec![
            NamedAdapter::new("lean", &[ChartType::Line]),
            NamedAdapter::new("quick", &[ChartType::Line]),
        ]);

        engine.monitor.record(RenderOutcome::success(
            "quick",
            ChartType::Line,
            100,
            Duration::from_millis(10),
            8192,
            9000,
        ));
        engine.monitor.record(RenderOutcome::success(
            "lean",
            ChartType::Line,
            100,
            Duration::from_millis(80),
            512,
            700,
        ));

        assert_eq!(
            engine.best_for(ChartType::Line, Criterion::Speed).as_deref(),
            Some("quick")
        );
        assert_eq!(
            engine.best_for(ChartType::Line, Criterion::Memory).as_deref(),
            Some("lean")
        );
        assert_eq!(
            engine
                .best_for(ChartType::Line, Criterion::Footprint)
                .as_deref(),
            Some("lean")
        );
        assert!(engine.best_for(ChartType::Pie, Criterion::Speed).is_none());
    }

    #[test]
    fn test_all_zero_weights_score_neutrally() {
        let engine = engine_with(vec![NamedAdapter::new("only", &[ChartType::Line])]);
        record_renders(&engine, "only", ChartType::Line, 3, 40);

        let zero = ScoreWeights {
            render_time: 0.0,
            memory: 0.0,
            output_size: 0.0,
        };
        let recs = engine.recommend_with_weights(ChartType::Line, &zero);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].score.is_finite());
        assert!((0.0..=10.0).contains(&recs[0].score));
        assert!((recs[0].score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_weights_change_ranking() {
        let engine = engine_with(vec![
            NamedAdapter::new("heavy-fast", &[ChartType::Line]),
            NamedAdapter::new("light-slow", &[ChartType::Line]),
        ]);

        for _ in 0..3 {
            engine.monitor.record(RenderOutcome::success(
                "heavy-fast",
                ChartType::Line,
                100,
                Duration::from_millis(10),
                50 * 1024 * 1024,
                2048,
            ));
            engine.monitor.record(RenderOutcome::success(
                "light-slow",
                ChartType::Line,
                100,
                Duration::from_millis(400),
                1024,
                2048,
            ));
        }

        let favor_speed = ScoreWeights {
            render_time: 1.0,
            memory: 0.0,
            output_size: 0.0,
        };
        let recs = engine.recommend_with_weights(ChartType::Line, &favor_speed);
        assert_eq!(recs[0].adapter, "heavy-fast");

        let favor_memory = ScoreWeights {
            render_time: 0.0,
            memory: 1.0,
            output_size: 0.0,
        };
        let recs = engine.recommend_with_weights(ChartType::Line, &favor_memory);
        assert_eq!(recs[0].adapter, "light-slow");
    }
}
