//! Error handling for the Multiviz rendering framework
//!
//! This module provides the error types for registry operations,
//! render attempts, and configuration handling. Structural errors
//! (registry/contract violations) are detected before any render
//! attempt; render-time failures are additionally captured in the
//! performance monitor as failed outcomes.

use thiserror::Error;

use crate::chart::ChartType;

/// The main error type for the rendering framework
#[derive(Error, Debug)]
pub enum VizError {
    /// Registry related errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Render related errors
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Registry specific errors
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Adapter '{name}' is already registered")]
    DuplicateAdapter { name: String },

    #[error("Adapter '{name}' not found")]
    AdapterNotFound { name: String },
}

/// Render specific errors
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart type '{chart_type}' is not supported by adapter '{adapter}'")]
    UnsupportedChartType {
        adapter: String,
        chart_type: ChartType,
    },

    #[error("Invalid data for chart type '{chart_type}': {reason}")]
    InvalidData {
        chart_type: ChartType,
        reason: String,
    },

    #[error("Adapter '{adapter}' failed to render: {reason}")]
    RenderFailure {
        adapter: String,
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Adapter '{adapter}' exceeded the render deadline: {elapsed_ms}ms > {limit_ms}ms")]
    Timeout {
        adapter: String,
        elapsed_ms: u64,
        limit_ms: u64,
    },
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration parsing error: {reason}")]
    ParseError { reason: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration file permission denied: {path}")]
    PermissionDenied { path: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, VizError>;

/// A specialized result type for registry operations
pub type RegistryResult<T> = std::result::Result<T, RegistryError>;

/// A specialized result type for render operations
pub type RenderResult<T> = std::result::Result<T, RenderError>;

/// A specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl RenderError {
    /// Build a render failure from an underlying backend error
    pub fn failure(
        adapter: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RenderError::RenderFailure {
            adapter: adapter.into(),
            reason: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a render failure from a plain message
    pub fn failure_msg(adapter: impl Into<String>, reason: impl Into<String>) -> Self {
        RenderError::RenderFailure {
            adapter: adapter.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// True for failures that happened inside (or past the deadline of)
    /// an actual render attempt, i.e. the ones recorded as telemetry.
    pub fn is_render_attempt(&self) -> bool {
        matches!(
            self,
            RenderError::RenderFailure { .. } | RenderError::Timeout { .. }
        )
    }
}

impl VizError {
    /// Get the error category for logging and telemetry
    pub fn category(&self) -> &'static str {
        match self {
            VizError::Registry(RegistryError::DuplicateAdapter { .. }) => "duplicate_adapter",
            VizError::Registry(RegistryError::AdapterNotFound { .. }) => "adapter_not_found",
            VizError::Render(RenderError::UnsupportedChartType { .. }) => "unsupported_chart_type",
            VizError::Render(RenderError::InvalidData { .. }) => "invalid_data",
            VizError::Render(RenderError::RenderFailure { .. }) => "render_failure",
            VizError::Render(RenderError::Timeout { .. }) => "timeout",
            VizError::Config(_) => "config",
            VizError::Serialization(_) => "serialization",
            VizError::Io(_) => "io",
        }
    }

    /// Check if this error should have produced a telemetry record.
    ///
    /// Structural violations never reach an adapter and are therefore
    /// never recorded; render-time failures always are.
    pub fn is_recorded(&self) -> bool {
        matches!(self, VizError::Render(e) if e.is_render_attempt())
    }
}

impl From<String> for VizError {
    fn from(msg: String) -> Self {
        VizError::Render(RenderError::RenderFailure {
            adapter: String::new(),
            reason: msg,
            source: None,
        })
    }
}
