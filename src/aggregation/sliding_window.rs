use super::calculator::WindowCalculator;
use crate::event::EventGroup;
use std::collections::VecDeque;
use tracing::debug;

/// Shared sliding window of event groups
///
/// Holds every group still inside the widest calculator window, oldest at the
/// front. Groups are only appended in release order, so the store stays
/// sorted by time and never holds two groups with the same time.
#[derive(Debug, Default)]
pub struct SlidingWindowStore {
    /// Time-ordered groups in the window
    groups: VecDeque<EventGroup>,
    /// Widest active calculator window
    widest: i64,
    /// Narrowest active calculator window
    narrowest: i64,
}

/// What a call to `evict` removed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvictionOutcome {
    /// Groups removed from the store
    pub evicted: usize,
    /// Successful calculator discounts, across all calculators
    pub discounted: usize,
}

impl SlidingWindowStore {
    /// Create a store bounded by the widest and narrowest calculator windows
    pub fn new(widest: i64, narrowest: i64) -> Self {
        Self {
            groups: VecDeque::new(),
            widest: widest.max(0),
            narrowest: narrowest.clamp(0, widest.max(0)),
        }
    }

    /// Create a store sized for a set of calculators
    pub fn for_calculators(calculators: &[Box<dyn WindowCalculator>]) -> Self {
        let sizes = calculators.iter().map(|c| c.window_size());
        let widest = sizes.clone().max().unwrap_or(0);
        let narrowest = sizes.min().unwrap_or(0);
        Self::new(widest, narrowest)
    }

    /// Widest window in seconds
    pub fn widest_window(&self) -> i64 {
        self.widest
    }

    /// Narrowest window in seconds
    pub fn narrowest_window(&self) -> i64 {
        self.narrowest
    }

    /// Whether a group at `time` can be appended without breaking time order
    pub fn accepts(&self, time: i64) -> bool {
        self.groups.back().map_or(true, |tail| tail.time() <= time)
    }

    /// Append a released group at the tail
    ///
    /// A group with the same time as the tail is merged into it. A group
    /// older than the tail is handed back untouched.
    pub fn append(&mut self, group: EventGroup) -> Result<(), EventGroup> {
        match self.groups.back_mut() {
            Some(tail) if tail.time() == group.time() => {
                debug!(time = group.time(), "Merging group into window tail");
                tail.merge(group)
            }
            Some(tail) if tail.time() > group.time() => Err(group),
            _ => {
                self.groups.push_back(group);
                Ok(())
            }
        }
    }

    /// Drop groups that left the widest window and let every calculator
    /// discount groups that left its own window
    pub fn evict(
        &mut self,
        newest_time: i64,
        calculators: &mut [Box<dyn WindowCalculator>],
    ) -> EvictionOutcome {
        let mut outcome = EvictionOutcome::default();

        while self
            .groups
            .front()
            .is_some_and(|front| newest_time.saturating_sub(front.time()) > self.widest)
        {
            let Some(outdated) = self.groups.pop_front() else {
                break;
            };
            for calc in calculators.iter_mut() {
                if calc.discount(&outdated, newest_time) {
                    outcome.discounted += 1;
                }
            }
            outcome.evicted += 1;
            debug!(
                time = outdated.time(),
                newest_time, "Evicted group from shared window"
            );
        }

        // Narrower windows. Once a group sits inside the narrowest window it
        // sits inside every window, and so does every newer group.
        for group in self.groups.iter() {
            if newest_time.saturating_sub(group.time()) <= self.narrowest {
                break;
            }
            for calc in calculators.iter_mut() {
                if calc.discount(group, newest_time) {
                    outcome.discounted += 1;
                }
            }
        }

        outcome
    }

    /// Number of groups in the window
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of events across all groups
    pub fn event_count(&self) -> usize {
        self.groups.iter().map(EventGroup::len).sum()
    }

    /// Iterate over groups, oldest first
    pub fn iter(&self) -> std::collections::vec_deque::Iter<'_, EventGroup> {
        self.groups.iter()
    }

    /// Times of the groups in the window, oldest first
    pub fn times(&self) -> Vec<i64> {
        self.groups.iter().map(EventGroup::time).collect()
    }

    /// Get the time range currently covered by the window
    pub fn time_range(&self) -> Option<(i64, i64)> {
        match (self.groups.front(), self.groups.back()) {
            (Some(first), Some(last)) => Some((first.time(), last.time())),
            _ => None,
        }
    }
}
