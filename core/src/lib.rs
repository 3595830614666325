//! Multiviz chart rendering framework library
//!
//! This library provides the core functionality for the Multiviz
//! framework: a uniform adapter contract over interchangeable chart
//! rendering back-ends, an instrumented registry that times and records
//! every render, and a recommendation engine that ranks back-ends from
//! the accumulated telemetry.

pub mod adapter;
pub mod adapters;
pub mod chart;
pub mod config;
pub mod error;
pub mod monitor;
pub mod recommend;
pub mod registry;

// Re-export commonly used types
pub use adapter::{AdapterDescriptor, ChartAdapter};
pub use adapters::{register_builtin_adapters, EChartsAdapter, SvgAdapter};
pub use chart::{
    ChartConfig, ChartIntent, ChartRequest, ChartType, Column, Dataset, ExportFormat,
    RenderedArtifact, Value,
};
pub use config::{MonitorConfig, RenderConfig, ScoreWeights, ScoringConfig, VizConfig};
pub use error::{ConfigError, RegistryError, RenderError, Result, VizError};
pub use monitor::{AggregatedStats, PerformanceMonitor, RenderOutcome, Trend};
pub use recommend::{Criterion, Recommendation, RecommendationEngine};
pub use registry::AdapterRegistry;
