//! Performance monitoring for render telemetry
//!
//! This module provides the thread-safe record of render outcomes and the
//! derived statistics the recommendation engine scores against. History
//! is a bounded ring buffer (oldest evicted first); aggregates are
//! maintained incrementally as running sums so reads stay cheap no matter
//! how large the buffer is.
//!
//! Aggregation strategy: running aggregates are lifetime totals and are
//! NOT retroactively corrected when old records are evicted from the
//! buffer. The median is the one figure derived from the retained window,
//! since it cannot be maintained from running sums.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::chart::ChartType;
use crate::config::MonitorConfig;

/// One immutable telemetry record of a single render attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOutcome {
    pub adapter: String,
    pub chart_type: ChartType,

    /// Number of input data points
    pub data_points: usize,

    /// Wall-clock render time
    pub render_time: Duration,

    /// Process RSS delta across the render, in bytes
    pub memory_bytes: u64,

    /// Size of the rendered payload in bytes (0 on failure)
    pub output_bytes: u64,

    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl RenderOutcome {
    pub fn success(
        adapter: impl Into<String>,
        chart_type: ChartType,
        data_points: usize,
        render_time: Duration,
        memory_bytes: u64,
        output_bytes: u64,
    ) -> Self {
        Self {
            adapter: adapter.into(),
            chart_type,
            data_points,
            render_time,
            memory_bytes,
            output_bytes,
            success: true,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failure(
        adapter: impl Into<String>,
        chart_type: ChartType,
        data_points: usize,
        render_time: Duration,
        memory_bytes: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            adapter: adapter.into(),
            chart_type,
            data_points,
            render_time,
            memory_bytes,
            output_bytes: 0,
            success: false,
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn render_time_ms(&self) -> f64 {
        self.render_time.as_secs_f64() * 1000.0
    }
}

/// Derived statistics for an adapter, optionally scoped to a chart type.
///
/// An instance with `count == 0` is the defined "no data" state; callers
/// check `is_empty()` instead of risking division by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AggregatedStats {
    pub count: u64,
    pub success_count: u64,
    pub failure_count: u64,

    /// Mean render time over successful outcomes, in milliseconds
    pub mean_render_time_ms: f64,

    /// Median render time over retained successful outcomes, in milliseconds
    pub median_render_time_ms: f64,

    /// Standard deviation of render time over successful outcomes
    pub stddev_render_time_ms: f64,

    pub mean_memory_bytes: f64,
    pub mean_output_bytes: f64,
}

impl AggregatedStats {
    /// The sentinel "no data" state
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fraction of attempts that succeeded, 0.0 when no attempts exist
    pub fn success_rate(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.success_count as f64 / self.count as f64
        }
    }
}

/// Render-time trend over a recent window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Degrading,
    Stable,
    InsufficientData,
}

/// Running sums for one aggregation key, updated in O(1) per record
#[derive(Debug, Clone, Default)]
struct RunningAggregate {
    count: u64,
    success_count: u64,
    failure_count: u64,
    sum_time_ms: f64,
    sum_time_sq_ms: f64,
    sum_memory_bytes: f64,
    sum_output_bytes: f64,
}

impl RunningAggregate {
    fn apply(&mut self, outcome: &RenderOutcome) {
        self.count += 1;
        if outcome.success {
            self.success_count += 1;
            let ms = outcome.render_time_ms();
            self.sum_time_ms += ms;
            self.sum_time_sq_ms += ms * ms;
            self.sum_memory_bytes += outcome.memory_bytes as f64;
            self.sum_output_bytes += outcome.output_bytes as f64;
        } else {
            self.failure_count += 1;
        }
    }

    fn snapshot(&self, median_ms: f64) -> AggregatedStats {
        if self.success_count == 0 {
            return AggregatedStats {
                count: self.count,
                success_count: 0,
                failure_count: self.failure_count,
                ..AggregatedStats::empty()
            };
        }

        let n = self.success_count as f64;
        let mean = self.sum_time_ms / n;
        let variance = (self.sum_time_sq_ms / n - mean * mean).max(0.0);

        AggregatedStats {
            count: self.count,
            success_count: self.success_count,
            failure_count: self.failure_count,
            mean_render_time_ms: mean,
            median_render_time_ms: median_ms,
            stddev_render_time_ms: variance.sqrt(),
            mean_memory_bytes: self.sum_memory_bytes / n,
            mean_output_bytes: self.sum_output_bytes / n,
        }
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    history: VecDeque<RenderOutcome>,
    by_adapter: HashMap<String, RunningAggregate>,
    by_chart: HashMap<(String, ChartType), RunningAggregate>,
}

/// Thread-safe store of render outcomes and derived statistics.
///
/// Explicitly constructed and passed by reference; each caller (and each
/// test) owns its monitor's lifetime instead of sharing global state.
pub struct PerformanceMonitor {
    state: Mutex<MonitorState>,
    config: MonitorConfig,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new(MonitorConfig::default())
    }
}

impl PerformanceMonitor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            state: Mutex::new(MonitorState::default()),
            config,
        }
    }

    /// Append one outcome and update the running aggregates.
    ///
    /// This is the telemetry write path: it never fails and never blocks
    /// beyond the short critical section. When the buffer is full the
    /// oldest record is evicted unconditionally.
    pub fn record(&self, outcome: RenderOutcome) {
        let mut state = self.lock();

        state
            .by_adapter
            .entry(outcome.adapter.clone())
            .or_default()
            .apply(&outcome);
        state
            .by_chart
            .entry((outcome.adapter.clone(), outcome.chart_type))
            .or_default()
            .apply(&outcome);

        if state.history.len() >= self.config.history_capacity {
            state.history.pop_front();
        }
        state.history.push_back(outcome);
    }

    /// Current aggregate for an adapter, optionally scoped to a chart type.
    ///
    /// Returns the empty sentinel (not an error) for unknown keys.
    pub fn aggregate(&self, adapter: &str, chart_type: Option<ChartType>) -> AggregatedStats {
        let state = self.lock();

        let running = match chart_type {
            Some(ct) => state.by_chart.get(&(adapter.to_string(), ct)),
            None => state.by_adapter.get(adapter),
        };

        match running {
            Some(agg) => {
                let median = Self::window_median(&state.history, adapter, chart_type);
                agg.snapshot(median)
            }
            None => AggregatedStats::empty(),
        }
    }

    /// Adapters that have recorded at least one outcome
    pub fn known_adapters(&self) -> Vec<String> {
        let state = self.lock();
        let mut names: Vec<String> = state.by_adapter.keys().cloned().collect();
        names.sort();
        names
    }

    /// The most recent outcomes, newest first, up to `limit`
    pub fn recent_outcomes(&self, limit: usize) -> Vec<RenderOutcome> {
        let state = self.lock();
        state.history.iter().rev().take(limit).cloned().collect()
    }

    /// Total outcomes currently retained in the buffer
    pub fn retained(&self) -> usize {
        self.lock().history.len()
    }

    /// Classify the render-time trend for an adapter over a time window.
    ///
    /// Splits the in-window successful outcomes in half by record order
    /// and compares mean render time between halves. Changes within the
    /// configured relative threshold classify as stable.
    pub fn analyze_trend(&self, adapter: &str, window: Duration) -> Trend {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::seconds(0));

        let times: Vec<f64> = {
            let state = self.lock();
            state
                .history
                .iter()
                .filter(|o| o.adapter == adapter && o.success && o.timestamp >= cutoff)
                .map(|o| o.render_time_ms())
                .collect()
        };

        if times.len() < self.config.trend_min_samples {
            return Trend::InsufficientData;
        }

        let mid = times.len() / 2;
        let first = mean(&times[..mid]);
        let second = mean(&times[mid..]);
        if first <= f64::EPSILON {
            return Trend::Stable;
        }

        let change_pct = (second - first) / first * 100.0;
        if change_pct.abs() <= self.config.trend_threshold_pct {
            Trend::Stable
        } else if change_pct < 0.0 {
            Trend::Improving
        } else {
            Trend::Degrading
        }
    }

    /// Reset history and all aggregates to empty
    pub fn clear(&self) {
        let mut state = self.lock();
        state.history.clear();
        state.by_adapter.clear();
        state.by_chart.clear();
        tracing::info!("performance monitor history cleared");
    }

    /// Serialize a point-in-time report of per-adapter statistics.
    ///
    /// Convenience export; the monitor itself is process-lifetime,
    /// in-memory state.
    pub fn export_report(&self) -> serde_json::Result<String> {
        let mut adapters = serde_json::Map::new();
        for name in self.known_adapters() {
            let stats = self.aggregate(&name, None);
            adapters.insert(name, serde_json::to_value(&stats)?);
        }

        let report = serde_json::json!({
            "generated_at": Utc::now(),
            "outcomes_retained": self.retained(),
            "adapters": adapters,
        });
        serde_json::to_string_pretty(&report)
    }

    fn window_median(
        history: &VecDeque<RenderOutcome>,
        adapter: &str,
        chart_type: Option<ChartType>,
    ) -> f64 {
        let mut times: Vec<f64> = history
            .iter()
            .filter(|o| {
                o.success
                    && o.adapter == adapter
                    && chart_type.map(|ct| o.chart_type == ct).unwrap_or(true)
            })
            .map(|o| o.render_time_ms())
            .collect();

        if times.is_empty() {
            return 0.0;
        }
        times.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = times.len() / 2;
        if times.len() % 2 == 0 {
            (times[mid - 1] + times[mid]) / 2.0
        } else {
            times[mid]
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MonitorState> {
        // Telemetry state is never left inconsistent by a panicking
        // holder; recover the guard rather than poisoning all callers.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
