//! Event consumption: reorder buffering and the analytics pipeline
//!
//! Parsed events enter through [`Processor::consume`], wait in the
//! [`IngestionBuffer`] until they can no longer be reordered, and are then
//! windowed and handed to every active calculator.
//!
//! # Example
//!
//! ```
//! use logs_monitor::aggregation::AnalyticsConfig;
//! use logs_monitor::consumer::{AnalyticsProcessor, Processor};
//! use logs_monitor::event::{Input, WebTrafficEventBuilder};
//! use logs_monitor::notify::RecordingNotifier;
//! use std::sync::Arc;
//!
//! # fn example() -> logs_monitor::Result<()> {
//! let notifier = Arc::new(RecordingNotifier::new());
//! let config = AnalyticsConfig::builder()
//!     .high_traffic_interval(60)
//!     .high_traffic_threshold(100)
//!     .build();
//! let mut processor = AnalyticsProcessor::new(&config, notifier.clone())?;
//!
//! processor.consume(Input::Event(WebTrafficEventBuilder::new().time(1).build()));
//! processor.consume(Input::EndOfStream);
//! assert_eq!(processor.window().len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod buffer;
pub mod processor;

pub use buffer::{IngestionBuffer, LateArrival, DEFAULT_LATENESS_TOLERANCE};
pub use processor::{AnalyticsProcessor, CalculatorInfo, Processor, ProcessorStats};
