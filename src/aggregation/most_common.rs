//! Most frequently requested section and most active source per window

use super::calculator::{WindowCalculator, WindowState};
use crate::event::{Event, EventGroup, Priority};
use crate::notify::Notifier;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Frequency table that forgets keys whose count drops to zero
#[derive(Debug, Default, Clone)]
pub struct FrequencyTable {
    counts: HashMap<String, u64>,
}

impl FrequencyTable {
    /// Count one occurrence of `key`
    pub fn increment(&mut self, key: &str) {
        *self.counts.entry(key.to_string()).or_insert(0) += 1;
    }

    /// Forget one occurrence of `key`
    pub fn decrement(&mut self, key: &str) {
        if let Some(count) = self.counts.get_mut(key) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.counts.remove(key);
            }
        }
    }

    /// Current count of `key`
    pub fn get(&self, key: &str) -> u64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Number of distinct keys with a positive count
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no key has a positive count
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Highest count; equal counts go to the lexicographically smallest key
    pub fn most_common(&self) -> Option<(&str, u64)> {
        self.counts
            .iter()
            .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then_with(|| kb.cmp(ka)))
            .map(|(key, count)| (key.as_str(), *count))
    }
}

/// Reports the most common section and source every `window` seconds
pub struct MostCommonCalculator {
    notifier: Arc<dyn Notifier>,
    window: WindowState,
    sections: FrequencyTable,
    sources: FrequencyTable,
    last_report: Option<i64>,
}

impl MostCommonCalculator {
    /// Create a calculator reporting over `window_size` seconds
    pub fn new(notifier: Arc<dyn Notifier>, window_size: i64) -> Self {
        Self {
            notifier,
            window: WindowState::new(window_size),
            sections: FrequencyTable::default(),
            sources: FrequencyTable::default(),
            last_report: None,
        }
    }

    /// Time of the last report, or of the first counted group before any
    /// report was due
    pub fn last_report_time(&self) -> Option<i64> {
        self.last_report
    }

    /// Section frequencies inside the window
    pub fn sections(&self) -> &FrequencyTable {
        &self.sections
    }

    /// Source frequencies inside the window
    pub fn sources(&self) -> &FrequencyTable {
        &self.sources
    }

    fn report_if_due(&mut self, latest_time: i64) {
        let last = *self.last_report.get_or_insert(latest_time);
        if latest_time.saturating_sub(last) < self.window.size() {
            return;
        }

        let (Some((section, section_hits)), Some((source, source_hits))) =
            (self.sections.most_common(), self.sources.most_common())
        else {
            return;
        };

        let report = Event::new(
            latest_time,
            format!(
                "Most common section: {section} ({section_hits} requests), \
                 source: {source} ({source_hits} requests)"
            ),
            Priority::Medium,
        );
        debug!(time = latest_time, "Fired stats report: {}", report.message);
        self.notifier.notify(&report);
        self.last_report = Some(latest_time);
    }
}

impl WindowCalculator for MostCommonCalculator {
    fn name(&self) -> &'static str {
        "most-common"
    }

    fn window_size(&self) -> i64 {
        self.window.size()
    }

    fn count(&mut self, group: &EventGroup) {
        if !self.is_active() {
            return;
        }
        for event in group {
            debug!(
                time = event.time(),
                "Counting {} from {}", event.section, event.source
            );
            self.sections.increment(&event.section);
            self.sources.increment(&event.source);
        }
        self.report_if_due(group.time());
    }

    fn discount(&mut self, group: &EventGroup, newest_time: i64) -> bool {
        if !self.window.try_discount(group.time(), newest_time) {
            return false;
        }
        for event in group {
            self.sections.decrement(&event.section);
            self.sources.decrement(&event.source);
        }
        // Shrinking counts never warrant a report; only growth does
        true
    }
}
