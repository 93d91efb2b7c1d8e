//! Processor trait and the analytics pipeline

use super::buffer::IngestionBuffer;
use crate::aggregation::{
    AnalyticsConfig, HighTrafficCalculator, MostCommonCalculator, SlidingWindowStore,
    WindowCalculator,
};
use crate::error::Result;
use crate::event::{EventGroup, Input};
use crate::notify::Notifier;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Trait for consumers of parsed log events
pub trait Processor {
    /// Consume one event or the end-of-stream signal
    ///
    /// Never fails: unusable input is logged and dropped.
    fn consume(&mut self, input: Input);

    /// Get processor name for logs
    fn name(&self) -> &str {
        "Processor"
    }
}

/// Counters describing what the processor has done so far
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Events accepted into the buffer
    pub accepted: u64,
    /// Events dropped for arriving too late
    pub dropped_late: u64,
    /// Groups released from the buffer into the window
    pub groups_released: u64,
    /// Groups evicted from the shared window
    pub groups_evicted: u64,
}

/// Name and window of an active calculator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorInfo {
    /// Calculator name
    pub name: &'static str,
    /// Window size in seconds
    pub window_size: i64,
}

/// Buffers, windows and analyzes web traffic events
///
/// Wires the ingestion buffer, the shared window store and the active
/// calculators into one synchronous per-event pipeline. Not internally
/// synchronized: feed it from a single thread.
pub struct AnalyticsProcessor {
    buffer: IngestionBuffer,
    window: SlidingWindowStore,
    calculators: Vec<Box<dyn WindowCalculator>>,
    stats: ProcessorStats,
}

impl AnalyticsProcessor {
    /// Build the pipeline from a configuration
    ///
    /// Calculators with non-positive parameters are left out.
    pub fn new(config: &AnalyticsConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        config.validate()?;

        let mut calculators: Vec<Box<dyn WindowCalculator>> = Vec::new();
        if config.most_common_enabled() {
            calculators.push(Box::new(MostCommonCalculator::new(
                notifier.clone(),
                config.most_common_interval,
            )));
        } else {
            info!("Most common stats calculator deactivated");
        }

        if config.high_traffic_enabled() {
            calculators.push(Box::new(HighTrafficCalculator::new(
                notifier,
                config.high_traffic_interval,
                config.high_traffic_threshold,
                config.traffic_metric,
            )));
        } else {
            info!("High traffic alerts calculator deactivated");
        }

        Ok(Self::with_calculators(
            IngestionBuffer::new(config.lateness_tolerance),
            calculators,
        ))
    }

    /// Build the pipeline from explicit parts
    ///
    /// Inactive calculators are dropped here so they never count or evict.
    pub fn with_calculators(
        buffer: IngestionBuffer,
        calculators: Vec<Box<dyn WindowCalculator>>,
    ) -> Self {
        let calculators: Vec<_> = calculators.into_iter().filter(|c| c.is_active()).collect();
        if calculators.is_empty() {
            warn!("No calculator is active, events will be windowed but not analyzed");
        }
        let window = SlidingWindowStore::for_calculators(&calculators);
        debug!(
            widest = window.widest_window(),
            narrowest = window.narrowest_window(),
            calculators = calculators.len(),
            "Analytics processor ready"
        );

        Self {
            buffer,
            window,
            calculators,
            stats: ProcessorStats::default(),
        }
    }

    /// Counters so far
    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    /// The shared window store
    pub fn window(&self) -> &SlidingWindowStore {
        &self.window
    }

    /// Number of events waiting in the reorder buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Widest active window
    pub fn widest_window(&self) -> i64 {
        self.window.widest_window()
    }

    /// Active calculators, in evaluation order
    pub fn active_calculators(&self) -> Vec<CalculatorInfo> {
        self.calculators
            .iter()
            .map(|c| CalculatorInfo {
                name: c.name(),
                window_size: c.window_size(),
            })
            .collect()
    }

    fn process_group(&mut self, group: EventGroup) {
        let time = group.time();
        if !self.window.accepts(time) {
            warn!(
                time,
                range = ?self.window.time_range(),
                "Dropped event group older than the window tail"
            );
            return;
        }

        let outcome = self.window.evict(time, &mut self.calculators);
        self.stats.groups_evicted += outcome.evicted as u64;

        for calc in self.calculators.iter_mut() {
            calc.count(&group);
        }
        if let Err(group) = self.window.append(group) {
            warn!(time = group.time(), "Window rejected a counted group");
        }
        self.stats.groups_released += 1;
        debug!(
            time,
            evicted = outcome.evicted,
            discounted = outcome.discounted,
            window_groups = self.window.len(),
            "Processed event group"
        );
    }
}

impl Processor for AnalyticsProcessor {
    fn consume(&mut self, input: Input) {
        let groups = match input {
            Input::Event(event) => match self.buffer.submit(event) {
                Ok(groups) => {
                    self.stats.accepted += 1;
                    groups
                }
                Err(late) => {
                    self.stats.dropped_late += 1;
                    warn!(
                        "Dropped log event as it arrived more than {}s late: {}",
                        self.buffer.tolerance(),
                        late.event
                    );
                    return;
                }
            },
            Input::EndOfStream => {
                let groups = self.buffer.flush();
                debug!(groups = groups.len(), "Flushed buffer at end of stream");
                groups
            }
        };

        for group in groups {
            self.process_group(group);
        }
    }

    fn name(&self) -> &str {
        "AnalyticsProcessor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::WebTrafficEventBuilder;
    use crate::notify::RecordingNotifier;

    fn event(time: i64) -> Input {
        WebTrafficEventBuilder::new().time(time).build().into()
    }

    #[test]
    fn test_deactivated_calculators_are_not_constructed() {
        let recorder = Arc::new(RecordingNotifier::new());
        let config = AnalyticsConfig::builder()
            .most_common_interval(10)
            .high_traffic_interval(-1)
            .build();
        let processor = AnalyticsProcessor::new(&config, recorder).unwrap();

        assert_eq!(
            processor.active_calculators(),
            vec![CalculatorInfo {
                name: "most-common",
                window_size: 10
            }]
        );
        assert_eq!(processor.widest_window(), 10);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let recorder = Arc::new(RecordingNotifier::new());
        let config = AnalyticsConfig::builder().lateness_tolerance(-2).build();
        assert!(AnalyticsProcessor::new(&config, recorder).is_err());
    }

    #[test]
    fn test_late_event_is_counted_and_dropped() {
        let recorder = Arc::new(RecordingNotifier::new());
        let config = AnalyticsConfig::builder().high_traffic_interval(-1).build();
        let mut processor = AnalyticsProcessor::new(&config, recorder).unwrap();

        for t in [2, 4, 5, 6, 1] {
            processor.consume(event(t));
        }

        let stats = processor.stats();
        assert_eq!(stats.accepted, 4);
        assert_eq!(stats.dropped_late, 1);
        assert_eq!(stats.groups_released, 1);
        assert_eq!(processor.window().times(), vec![2]);
        assert_eq!(processor.buffered(), 3);
    }

    #[test]
    fn test_end_of_stream_flushes_buffer() {
        let recorder = Arc::new(RecordingNotifier::new());
        let mut processor =
            AnalyticsProcessor::new(&AnalyticsConfig::default(), recorder).unwrap();

        processor.consume(event(1));
        processor.consume(event(2));
        assert_eq!(processor.buffered(), 2);

        processor.consume(Input::EndOfStream);
        assert_eq!(processor.buffered(), 0);
        assert_eq!(processor.window().times(), vec![1, 2]);
    }

    #[test]
    fn test_extreme_times_are_windowed_without_overflow() {
        let recorder = Arc::new(RecordingNotifier::new());
        let mut processor =
            AnalyticsProcessor::new(&AnalyticsConfig::default(), recorder).unwrap();

        processor.consume(event(i64::MIN));
        processor.consume(event(i64::MAX));
        processor.consume(Input::EndOfStream);

        assert_eq!(processor.window().times(), vec![i64::MAX]);
        assert_eq!(processor.stats().groups_released, 2);
        assert_eq!(processor.stats().groups_evicted, 1);
    }
}
