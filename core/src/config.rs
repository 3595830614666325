//! Configuration management for the rendering framework
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files and environment variables. Scoring weights live here
//! rather than in code so deployments can tune "favor speed" versus
//! "favor footprint" without rebuilding.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Main configuration structure for the rendering framework
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VizConfig {
    /// Performance monitor configuration
    pub monitor: MonitorConfig,

    /// Recommendation scoring configuration
    pub scoring: ScoringConfig,

    /// Render dispatch configuration
    pub render: RenderConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Performance monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Maximum number of outcomes retained in the history buffer
    pub history_capacity: usize,

    /// Minimum in-window samples before a trend is reported
    pub trend_min_samples: usize,

    /// Relative change (percent) below which a trend counts as stable
    pub trend_threshold_pct: f64,
}

/// Weights combined into a recommendation score.
///
/// Lower is better for every metric; the weights decide how much each
/// metric contributes. They are normalized at scoring time, so only their
/// ratios matter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub render_time: f64,
    pub memory: f64,
    pub output_size: f64,
}

/// Recommendation scoring configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Neutral score (0-10) for adapters with no recorded telemetry
    pub baseline_score: f64,

    /// Metric weights for the combined score
    pub weights: ScoreWeights,

    /// Mean render time under which an adapter counts as fast, in ms
    pub fast_render_ms: f64,

    /// Mean output size under which output counts as compact, in bytes
    pub compact_output_bytes: u64,

    /// Mean memory delta under which footprint counts as low, in bytes
    pub low_memory_bytes: u64,

    /// Maximum justification strings attached per recommendation
    pub max_reasons: usize,
}

/// Render dispatch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Default render deadline in milliseconds; 0 disables the deadline
    pub default_timeout_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,

    /// Output format ("text" or "json")
    pub format: String,

    /// Log to stderr
    pub console: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            trend_min_samples: 10,
            trend_threshold_pct: 5.0,
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            render_time: 0.5,
            memory: 0.25,
            output_size: 0.25,
        }
    }
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.render_time + self.memory + self.output_size
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            baseline_score: 5.0,
            weights: ScoreWeights::default(),
            fast_render_ms: 100.0,
            compact_output_bytes: 10_000,
            low_memory_bytes: 1024 * 1024,
            max_reasons: 3,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            console: true,
        }
    }
}

impl RenderConfig {
    /// The default deadline as a duration, if one is configured
    pub fn default_timeout(&self) -> Option<std::time::Duration> {
        if self.default_timeout_ms == 0 {
            None
        } else {
            Some(std::time::Duration::from_millis(self.default_timeout_ms))
        }
    }
}

impl VizConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.to_string_lossy().to_string(),
        })?;

        let config: VizConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables over defaults
    pub fn from_env() -> ConfigResult<Self> {
        let mut config = VizConfig::default();

        if let Ok(capacity) = std::env::var("MULTIVIZ_HISTORY_CAPACITY") {
            config.monitor.history_capacity =
                capacity.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "MULTIVIZ_HISTORY_CAPACITY".to_string(),
                    value: capacity,
                })?;
        }

        if let Ok(baseline) = std::env::var("MULTIVIZ_BASELINE_SCORE") {
            config.scoring.baseline_score =
                baseline.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "MULTIVIZ_BASELINE_SCORE".to_string(),
                    value: baseline,
                })?;
        }

        if let Ok(timeout) = std::env::var("MULTIVIZ_DEFAULT_TIMEOUT_MS") {
            config.render.default_timeout_ms =
                timeout.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "MULTIVIZ_DEFAULT_TIMEOUT_MS".to_string(),
                    value: timeout,
                })?;
        }

        if let Ok(level) = std::env::var("MULTIVIZ_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback order: file -> env -> defaults
    pub fn load_with_fallback<P: AsRef<Path>>(config_path: Option<P>) -> ConfigResult<Self> {
        let mut config = VizConfig::default();

        if let Some(path) = config_path {
            if path.as_ref().exists() {
                config = VizConfig::from_file(path)?;
            }
        }

        if let Ok(env_config) = VizConfig::from_env() {
            config = config.merge_with(env_config);
        }

        config.validate()?;
        Ok(config)
    }

    /// Merge this configuration with another, preferring values from other
    pub fn merge_with(mut self, other: VizConfig) -> Self {
        self.monitor = other.monitor;
        self.scoring = other.scoring;
        self.render = other.render;
        self.logging = other.logging;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.monitor.history_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.history_capacity".to_string(),
                value: "0".to_string(),
            });
        }

        if self.monitor.trend_min_samples < 2 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.trend_min_samples".to_string(),
                value: self.monitor.trend_min_samples.to_string(),
            });
        }

        if self.monitor.trend_threshold_pct <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "monitor.trend_threshold_pct".to_string(),
                value: self.monitor.trend_threshold_pct.to_string(),
            });
        }

        if !(0.0..=10.0).contains(&self.scoring.baseline_score) {
            return Err(ConfigError::InvalidValue {
                field: "scoring.baseline_score".to_string(),
                value: self.scoring.baseline_score.to_string(),
            });
        }

        let weights = &self.scoring.weights;
        if weights.render_time < 0.0 || weights.memory < 0.0 || weights.output_size < 0.0 {
            return Err(ConfigError::ValidationFailed {
                reason: "scoring weights must be non-negative".to_string(),
            });
        }
        if weights.total() <= 0.0 {
            return Err(ConfigError::ValidationFailed {
                reason: "at least one scoring weight must be positive".to_string(),
            });
        }

        if self.scoring.max_reasons == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scoring.max_reasons".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("multiviz").join("multiviz.toml"))
            .ok_or_else(|| ConfigError::ValidationFailed {
                reason: "Unable to determine config directory".to_string(),
            })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::ValidationFailed {
                reason: format!("Unable to create config directory: {}", parent.display()),
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationFailed {
            reason: e.to_string(),
        })?;

        fs::write(path, content).map_err(|_| ConfigError::PermissionDenied {
            path: path.to_string_lossy().to_string(),
        })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = VizConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.monitor.history_capacity, 1000);
        assert!((config.scoring.baseline_score - 5.0).abs() < f64::EPSILON);
        assert!(config.render.default_timeout().is_none());
    }

    #[test]
    fn test_config_validation() {
        let mut config = VizConfig::default();

        config.monitor.history_capacity = 0;
        assert!(config.validate().is_err());

        config.monitor.history_capacity = 100;
        config.scoring.baseline_score = 12.0;
        assert!(config.validate().is_err());

        config.scoring.baseline_score = 5.0;
        config.scoring.weights = ScoreWeights {
            render_time: 0.0,
            memory: 0.0,
            output_size: 0.0,
        };
        assert!(config.validate().is_err());

        config.scoring.weights = ScoreWeights::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_file_round_trip() {
        let mut config = VizConfig::default();
        config.monitor.history_capacity = 250;
        config.scoring.weights.render_time = 0.8;

        let temp_file = NamedTempFile::new().unwrap();
        config.save_to_file(temp_file.path()).unwrap();

        let loaded = VizConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: VizConfig = toml::from_str(
            r#"
            [monitor]
            history_capacity = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.monitor.history_capacity, 50);
        assert_eq!(config.monitor.trend_min_samples, 10);
        assert_eq!(config.scoring.max_reasons, 3);
    }

    #[test]
    fn test_config_merge() {
        let config1 = VizConfig::default();
        let mut config2 = VizConfig::default();
        config2.render.default_timeout_ms = 2000;

        let merged = config1.merge_with(config2);
        assert_eq!(merged.render.default_timeout_ms, 2000);
    }
}
