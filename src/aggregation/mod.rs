/// Window calculator capability and eviction watermark
pub mod calculator;
/// Configuration types for the analytics pipeline
pub mod config;
/// High-traffic threshold alarm
pub mod high_traffic;
/// Most common section and source reports
pub mod most_common;
/// Shared sliding window of event groups
pub mod sliding_window;

pub use calculator::{WindowCalculator, WindowState};
pub use config::{AnalyticsConfig, AnalyticsConfigBuilder, TrafficMetric};
pub use high_traffic::HighTrafficCalculator;
pub use most_common::{FrequencyTable, MostCommonCalculator};
pub use sliding_window::{EvictionOutcome, SlidingWindowStore};
