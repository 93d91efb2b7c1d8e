//! Streaming analytics over HTTP access logs
//!
//! Parsed access-log records flow through a reorder buffer that absorbs
//! bounded arrival disorder, into a shared sliding window of per-second event
//! groups. Window calculators count each group as it enters the window and
//! discount it when it leaves theirs, and push their findings (periodic
//! most-common reports, high-traffic alerts) to a [`notify::Notifier`].
//!
//! # Example
//!
//! ```no_run
//! use logs_monitor::aggregation::AnalyticsConfig;
//! use logs_monitor::consumer::AnalyticsProcessor;
//! use logs_monitor::notify::TerminalNotifier;
//! use logs_monitor::reader::{LogReader, ReaderConfig};
//! use std::sync::Arc;
//!
//! # fn example() -> anyhow::Result<()> {
//! let notifier = Arc::new(TerminalNotifier::stdout());
//! notifier.print_header();
//!
//! let mut processor = AnalyticsProcessor::new(&AnalyticsConfig::default(), notifier)?;
//! let mut reader = LogReader::new(ReaderConfig::new("/tmp/access.log"));
//! reader.run_once(&mut processor)?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

// Re-export commonly used items
pub use aggregation::{AnalyticsConfig, TrafficMetric};
pub use consumer::{AnalyticsProcessor, Processor};
pub use error::{MonitorError, RecordError, Result};
pub use event::{Event, EventGroup, Input, Priority, WebTrafficEvent};
pub use notify::Notifier;

/// Error types
pub mod error;

/// Event model
pub mod event;

/// Sliding window store and window calculators
pub mod aggregation;

/// Reorder buffering and the analytics pipeline
pub mod consumer;

/// Access-log record parsing
pub mod parser;

/// Access-log file reading
pub mod reader;

/// Report and alert delivery
pub mod notify;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber
///
/// `RUST_LOG` takes precedence over `level`; an unparseable level falls back
/// to `info`.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
