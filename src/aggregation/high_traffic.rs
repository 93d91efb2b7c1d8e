//! High-traffic alarm with hysteresis

use super::calculator::{WindowCalculator, WindowState};
use super::config::TrafficMetric;
use crate::event::{Event, EventGroup, Priority};
use crate::notify::{format_time, Notifier};
use std::sync::Arc;
use tracing::debug;

/// Alerts once when traffic inside the window exceeds a threshold, and once
/// when it falls back to or below it
pub struct HighTrafficCalculator {
    notifier: Arc<dyn Notifier>,
    window: WindowState,
    threshold: i64,
    metric: TrafficMetric,
    total: i64,
    alarmed: bool,
}

impl HighTrafficCalculator {
    /// Create an alarm over `window_size` seconds
    pub fn new(
        notifier: Arc<dyn Notifier>,
        window_size: i64,
        threshold: i64,
        metric: TrafficMetric,
    ) -> Self {
        Self {
            notifier,
            window: WindowState::new(window_size),
            threshold,
            metric,
            total: 0,
            alarmed: false,
        }
    }

    /// Number of events currently inside the window
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Volume compared against the threshold
    pub fn current_value(&self) -> f64 {
        match self.metric {
            TrafficMetric::Count => self.total as f64,
            TrafficMetric::Average => self.total as f64 / self.window.size().max(1) as f64,
        }
    }

    /// Whether the alarm is raised
    pub fn is_alarmed(&self) -> bool {
        self.alarmed
    }

    fn format_value(&self) -> String {
        match self.metric {
            TrafficMetric::Count => self.total.to_string(),
            TrafficMetric::Average => format!("{:.2}", self.current_value()),
        }
    }

    fn evaluate(&mut self, now: i64) {
        let value = self.current_value();
        let threshold = self.threshold as f64;
        debug!(value, threshold, "High traffic volume");

        if value > threshold && !self.alarmed {
            let alert = Event::new(
                now,
                format!(
                    "High traffic generated an alert - hits {}, triggered at {}",
                    self.format_value(),
                    format_time(now)
                ),
                Priority::High,
            );
            self.notifier.notify(&alert);
            self.alarmed = true;
            debug!("High traffic, fired {}", alert);
        } else if value <= threshold && self.alarmed {
            let alert = Event::new(
                now,
                format!("Traffic is now back to normal as of {}", format_time(now)),
                Priority::High,
            );
            self.notifier.notify(&alert);
            self.alarmed = false;
            debug!("High traffic back to normal, fired {}", alert);
        }
    }
}

impl WindowCalculator for HighTrafficCalculator {
    fn name(&self) -> &'static str {
        "high-traffic"
    }

    fn window_size(&self) -> i64 {
        self.window.size()
    }

    fn is_active(&self) -> bool {
        self.window.size() > 0 && self.threshold > 0
    }

    fn count(&mut self, group: &EventGroup) {
        if !self.is_active() {
            return;
        }
        self.total += group.len() as i64;
        self.evaluate(group.time());
    }

    fn discount(&mut self, group: &EventGroup, newest_time: i64) -> bool {
        if !self.is_active() || !self.window.try_discount(group.time(), newest_time) {
            return false;
        }
        self.total -= group.len() as i64;
        self.evaluate(newest_time);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::WebTrafficEventBuilder;
    use crate::notify::RecordingNotifier;

    fn group(time: i64, size: usize) -> EventGroup {
        let mut group = EventGroup::new(WebTrafficEventBuilder::new().time(time).build());
        for _ in 1..size {
            group
                .push(WebTrafficEventBuilder::new().time(time).build())
                .unwrap();
        }
        group
    }

    #[test]
    fn test_alert_fires_once_above_threshold() {
        let recorder = Arc::new(RecordingNotifier::new());
        let mut calc = HighTrafficCalculator::new(recorder.clone(), 10, 2, TrafficMetric::Count);

        calc.count(&group(0, 2));
        assert!(recorder.is_empty());

        calc.count(&group(1, 1));
        assert_eq!(recorder.len(), 1);
        let alert = recorder.last().unwrap();
        assert_eq!(alert.priority, Priority::High);
        assert_eq!(alert.time, 1);
        assert_eq!(
            alert.message,
            "High traffic generated an alert - hits 3, triggered at 1970-01-01 00:00:01"
        );

        calc.count(&group(2, 5));
        assert_eq!(recorder.len(), 1);
        assert!(calc.is_alarmed());
    }

    #[test]
    fn test_recovery_fires_once() {
        let recorder = Arc::new(RecordingNotifier::new());
        let mut calc = HighTrafficCalculator::new(recorder.clone(), 3, 2, TrafficMetric::Count);
        let old = group(0, 3);

        calc.count(&old);
        assert!(calc.is_alarmed());

        assert!(calc.discount(&old, 4));
        assert!(!calc.is_alarmed());
        assert_eq!(recorder.len(), 2);
        let alert = recorder.last().unwrap();
        assert_eq!(alert.time, 4);
        assert_eq!(
            alert.message,
            "Traffic is now back to normal as of 1970-01-01 00:00:04"
        );

        // Already discounted
        assert!(!calc.discount(&old, 5));
        assert_eq!(calc.total(), 0);
        assert_eq!(recorder.len(), 2);
    }

    #[test]
    fn test_average_metric() {
        let recorder = Arc::new(RecordingNotifier::new());
        let mut calc = HighTrafficCalculator::new(recorder.clone(), 3, 2, TrafficMetric::Average);

        calc.count(&group(0, 6));
        assert_eq!(calc.current_value(), 2.0);
        assert!(recorder.is_empty());

        calc.count(&group(3, 1));
        assert!((calc.current_value() - 7.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(
            recorder.last().unwrap().message,
            "High traffic generated an alert - hits 2.33, triggered at 1970-01-01 00:00:03"
        );
    }

    #[test]
    fn test_zero_threshold_is_inactive() {
        let recorder = Arc::new(RecordingNotifier::new());
        let mut calc = HighTrafficCalculator::new(recorder.clone(), 10, 0, TrafficMetric::Count);

        assert!(!calc.is_active());
        calc.count(&group(0, 100));
        assert_eq!(calc.total(), 0);
        assert!(recorder.is_empty());
    }
}
