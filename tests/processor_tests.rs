use logs_monitor::aggregation::{AnalyticsConfig, TrafficMetric, WindowCalculator, WindowState};
use logs_monitor::consumer::{AnalyticsProcessor, IngestionBuffer, Processor};
use logs_monitor::event::{EventGroup, Input, Priority, WebTrafficEventBuilder};
use logs_monitor::notify::RecordingNotifier;
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn event(time: i64) -> Input {
    WebTrafficEventBuilder::new().time(time).build().into()
}

fn request(time: i64, section: &str, source: &str) -> Input {
    WebTrafficEventBuilder::new()
        .time(time)
        .section(section)
        .source(source)
        .build()
        .into()
}

fn high_traffic_only(window: i64, threshold: i64, metric: TrafficMetric) -> AnalyticsConfig {
    AnalyticsConfig::builder()
        .most_common_interval(0)
        .high_traffic_interval(window)
        .high_traffic_threshold(threshold)
        .traffic_metric(metric)
        .build()
}

fn messages(recorder: &RecordingNotifier) -> Vec<(i64, String)> {
    recorder
        .events()
        .into_iter()
        .map(|e| (e.time, e.message))
        .collect()
}

type DiscountLog = Arc<Mutex<Vec<(&'static str, i64)>>>;

/// Calculator that only records which groups it discounted
struct Tracker {
    name: &'static str,
    window: WindowState,
    log: DiscountLog,
}

impl Tracker {
    fn boxed(name: &'static str, size: i64, log: &DiscountLog) -> Box<dyn WindowCalculator> {
        Box::new(Self {
            name,
            window: WindowState::new(size),
            log: log.clone(),
        })
    }
}

impl WindowCalculator for Tracker {
    fn name(&self) -> &'static str {
        self.name
    }

    fn window_size(&self) -> i64 {
        self.window.size()
    }

    fn count(&mut self, _group: &EventGroup) {}

    fn discount(&mut self, group: &EventGroup, newest_time: i64) -> bool {
        if !self.window.try_discount(group.time(), newest_time) {
            return false;
        }
        self.log.lock().push((self.name, group.time()));
        true
    }
}

#[test]
fn test_high_traffic_count_crosses_threshold_once() {
    let recorder = Arc::new(RecordingNotifier::new());
    let config = high_traffic_only(3, 2, TrafficMetric::Count);
    let mut processor = AnalyticsProcessor::new(&config, recorder.clone()).unwrap();

    for t in [0, 1, 2, 3, 3, 3] {
        processor.consume(event(t));
    }
    processor.consume(Input::EndOfStream);

    // The third event already pushes the count over 2
    assert_eq!(
        messages(&recorder),
        vec![(
            2,
            "High traffic generated an alert - hits 3, triggered at 1970-01-01 00:00:02"
                .to_string()
        )]
    );
    assert_eq!(recorder.last().unwrap().priority, Priority::High);
    assert_eq!(processor.window().times(), vec![0, 1, 2, 3]);
    assert_eq!(processor.window().event_count(), 6);
}

#[test]
fn test_high_traffic_average_alerts_at_burst() {
    let recorder = Arc::new(RecordingNotifier::new());
    let config = high_traffic_only(3, 2, TrafficMetric::Average);
    let mut processor = AnalyticsProcessor::new(&config, recorder.clone()).unwrap();

    for t in [0, 1, 2, 3, 3, 3, 3] {
        processor.consume(event(t));
    }
    processor.consume(Input::EndOfStream);

    assert_eq!(
        messages(&recorder),
        vec![(
            3,
            "High traffic generated an alert - hits 2.33, triggered at 1970-01-01 00:00:03"
                .to_string()
        )]
    );
}

#[test]
fn test_high_traffic_hysteresis() {
    let recorder = Arc::new(RecordingNotifier::new());
    let config = high_traffic_only(3, 2, TrafficMetric::Count);
    let mut processor = AnalyticsProcessor::new(&config, recorder.clone()).unwrap();

    for t in [0, 0, 0, 0, 10, 11, 11, 11, 11] {
        processor.consume(event(t));
        processor.consume(Input::EndOfStream);
    }

    assert_eq!(
        messages(&recorder),
        vec![
            (
                0,
                "High traffic generated an alert - hits 3, triggered at 1970-01-01 00:00:00"
                    .to_string()
            ),
            (
                10,
                "Traffic is now back to normal as of 1970-01-01 00:00:10".to_string()
            ),
            (
                11,
                "High traffic generated an alert - hits 3, triggered at 1970-01-01 00:00:11"
                    .to_string()
            ),
        ]
    );
}

#[test]
fn test_most_common_reports_every_interval() {
    let recorder = Arc::new(RecordingNotifier::new());
    let config = AnalyticsConfig::builder()
        .most_common_interval(10)
        .high_traffic_interval(0)
        .build();
    let mut processor = AnalyticsProcessor::new(&config, recorder.clone()).unwrap();

    let inputs = [
        request(0, "/api", "10.0.0.1"),
        request(10, "/report", "10.0.0.2"),
        request(11, "/report", "10.0.0.2"),
        request(12, "/api", "10.0.0.1"),
        request(20, "/api", "10.0.0.2"),
    ];
    for input in inputs {
        processor.consume(input);
        processor.consume(Input::EndOfStream);
    }

    // The group at 0 has left the window by the second report
    assert_eq!(
        messages(&recorder),
        vec![
            (
                10,
                "Most common section: /api (1 requests), source: 10.0.0.1 (1 requests)"
                    .to_string()
            ),
            (
                20,
                "Most common section: /api (2 requests), source: 10.0.0.2 (3 requests)"
                    .to_string()
            ),
        ]
    );
    assert!(recorder
        .events()
        .iter()
        .all(|e| e.priority == Priority::Medium));
    assert_eq!(processor.window().times(), vec![10, 11, 12, 20]);
}

#[test]
fn test_narrow_window_discounts_before_wide_window_and_store() {
    let log = DiscountLog::default();
    let mut processor = AnalyticsProcessor::with_calculators(
        IngestionBuffer::new(2),
        vec![
            Tracker::boxed("narrow", 60, &log),
            Tracker::boxed("wide", 120, &log),
        ],
    );

    processor.consume(event(0));
    processor.consume(event(30));
    processor.consume(Input::EndOfStream);

    processor.consume(event(61));
    processor.consume(Input::EndOfStream);
    assert_eq!(*log.lock(), vec![("narrow", 0)]);
    assert_eq!(processor.window().times(), vec![0, 30, 61]);

    processor.consume(event(100));
    processor.consume(Input::EndOfStream);
    assert_eq!(*log.lock(), vec![("narrow", 0), ("narrow", 30)]);
    assert_eq!(processor.window().times(), vec![0, 30, 61, 100]);

    processor.consume(event(121));
    processor.consume(Input::EndOfStream);
    assert_eq!(
        *log.lock(),
        vec![("narrow", 0), ("narrow", 30), ("wide", 0)]
    );
    assert_eq!(processor.window().times(), vec![30, 61, 100, 121]);
    assert_eq!(processor.stats().groups_evicted, 1);
}

#[test]
fn test_late_event_leaves_no_trace() {
    let recorder = Arc::new(RecordingNotifier::new());
    let config = high_traffic_only(10, 1, TrafficMetric::Count);
    let mut processor = AnalyticsProcessor::new(&config, recorder.clone()).unwrap();

    processor.consume(event(5));
    processor.consume(event(6));
    processor.consume(Input::EndOfStream);
    let alerts = recorder.len();
    let times = processor.window().times();

    processor.consume(event(4));
    processor.consume(Input::EndOfStream);

    assert_eq!(recorder.len(), alerts);
    assert_eq!(processor.window().times(), times);
    assert_eq!(processor.stats().dropped_late, 1);
    assert_eq!(processor.stats().accepted, 2);
}

#[test]
fn test_tie_with_released_group_is_merged() {
    let recorder = Arc::new(RecordingNotifier::new());
    let config = high_traffic_only(10, 2, TrafficMetric::Count);
    let mut processor = AnalyticsProcessor::new(&config, recorder.clone()).unwrap();

    processor.consume(event(5));
    processor.consume(event(5));
    processor.consume(Input::EndOfStream);
    processor.consume(event(5));
    processor.consume(Input::EndOfStream);

    assert_eq!(processor.window().times(), vec![5]);
    assert_eq!(processor.window().event_count(), 3);
    assert_eq!(processor.stats().dropped_late, 0);
    assert_eq!(recorder.len(), 1);
}

#[test]
fn test_flush_without_pending_events_is_a_no_op() {
    let recorder = Arc::new(RecordingNotifier::new());
    let config = high_traffic_only(3, 1, TrafficMetric::Count);
    let mut processor = AnalyticsProcessor::new(&config, recorder.clone()).unwrap();

    for t in [1, 2, 3] {
        processor.consume(event(t));
    }
    processor.consume(Input::EndOfStream);
    let alerts = recorder.events();
    let stats = processor.stats();
    let times = processor.window().times();

    processor.consume(Input::EndOfStream);
    processor.consume(Input::EndOfStream);

    assert_eq!(recorder.events(), alerts);
    assert_eq!(processor.stats(), stats);
    assert_eq!(processor.window().times(), times);
}

#[test]
fn test_no_active_calculator_keeps_only_newest_group() {
    let recorder = Arc::new(RecordingNotifier::new());
    let config = AnalyticsConfig::builder()
        .most_common_interval(0)
        .high_traffic_threshold(0)
        .build();
    let mut processor = AnalyticsProcessor::new(&config, recorder.clone()).unwrap();
    assert!(processor.active_calculators().is_empty());

    for t in [1, 2, 3, 4] {
        processor.consume(event(t));
    }
    processor.consume(Input::EndOfStream);

    assert_eq!(processor.widest_window(), 0);
    assert_eq!(processor.window().times(), vec![4]);
    assert!(recorder.is_empty());
}

#[test]
fn test_release_order_is_time_order() {
    let recorder = Arc::new(RecordingNotifier::new());
    let mut processor = AnalyticsProcessor::new(&AnalyticsConfig::default(), recorder).unwrap();

    for t in [3, 1, 2, 5, 4, 8, 7, 6] {
        processor.consume(event(t));
    }
    processor.consume(Input::EndOfStream);

    assert_eq!(processor.window().times(), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(processor.stats().dropped_late, 0);
}
