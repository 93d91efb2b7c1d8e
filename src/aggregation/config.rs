//! Analytics configuration structures

use crate::error::{ErrorContext, MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the high-traffic calculator measures volume before comparing it to
/// its threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrafficMetric {
    /// Raw number of events inside the window
    #[default]
    Count,
    /// Events per second over the window length
    Average,
}

/// Configuration for the analytics processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Window of the most-common report in seconds (<= 0 disables it)
    pub most_common_interval: i64,

    /// Window of the high-traffic alarm in seconds (<= 0 disables it)
    pub high_traffic_interval: i64,

    /// Volume that must be exceeded within the window to raise the alarm
    /// (<= 0 disables it)
    pub high_traffic_threshold: i64,

    /// Seconds of arrival disorder tolerated before events are released
    pub lateness_tolerance: i64,

    /// Volume measure used by the high-traffic alarm
    pub traffic_metric: TrafficMetric,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            most_common_interval: 10,
            high_traffic_interval: 120,
            high_traffic_threshold: 10,
            lateness_tolerance: 2,
            traffic_metric: TrafficMetric::Count,
        }
    }
}

impl AnalyticsConfig {
    /// Create a new configuration builder
    pub fn builder() -> AnalyticsConfigBuilder {
        AnalyticsConfigBuilder::new()
    }

    /// Load a configuration from a YAML file; missing keys keep their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(MonitorError::from)
            .context(format!("reading {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    /// Parse a configuration from YAML text
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Non-positive calculator parameters are valid: they deactivate the
    /// calculator.
    pub fn validate(&self) -> Result<()> {
        if self.lateness_tolerance < 0 {
            return Err(MonitorError::Configuration(format!(
                "lateness tolerance must be >= 0, got {}",
                self.lateness_tolerance
            )));
        }
        Ok(())
    }

    /// Whether the most-common calculator will be constructed
    pub fn most_common_enabled(&self) -> bool {
        self.most_common_interval > 0
    }

    /// Whether the high-traffic calculator will be constructed
    pub fn high_traffic_enabled(&self) -> bool {
        self.high_traffic_interval > 0 && self.high_traffic_threshold > 0
    }
}

/// Builder for AnalyticsConfig
pub struct AnalyticsConfigBuilder {
    config: AnalyticsConfig,
}

impl AnalyticsConfigBuilder {
    /// Create a new builder seeded with defaults
    pub fn new() -> Self {
        Self {
            config: AnalyticsConfig::default(),
        }
    }

    /// Set the most-common report window
    pub fn most_common_interval(mut self, seconds: i64) -> Self {
        self.config.most_common_interval = seconds;
        self
    }

    /// Set the high-traffic window
    pub fn high_traffic_interval(mut self, seconds: i64) -> Self {
        self.config.high_traffic_interval = seconds;
        self
    }

    /// Set the high-traffic threshold
    pub fn high_traffic_threshold(mut self, threshold: i64) -> Self {
        self.config.high_traffic_threshold = threshold;
        self
    }

    /// Set the reorder tolerance of the ingestion buffer
    pub fn lateness_tolerance(mut self, seconds: i64) -> Self {
        self.config.lateness_tolerance = seconds;
        self
    }

    /// Set the high-traffic volume measure
    pub fn traffic_metric(mut self, metric: TrafficMetric) -> Self {
        self.config.traffic_metric = metric;
        self
    }

    /// Build the configuration
    pub fn build(self) -> AnalyticsConfig {
        self.config
    }
}

impl Default for AnalyticsConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
