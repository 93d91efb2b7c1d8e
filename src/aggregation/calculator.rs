//! Window calculator capability and shared eviction watermark

use crate::event::EventGroup;
use tracing::debug;

/// Statistics computed over a trailing time window of event groups
///
/// The processor calls `count` once for every group released into the shared
/// window store, and `discount` for groups that may have left this
/// calculator's window. Calculators own all of their state.
pub trait WindowCalculator: Send {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Window size in seconds; non-positive means deactivated
    fn window_size(&self) -> i64;

    /// Incorporate a newly released group, then evaluate alert conditions
    fn count(&mut self, group: &EventGroup);

    /// Remove the group's contribution if it is outside this calculator's
    /// window relative to `newest_time`
    ///
    /// Returns whether anything was removed. Never removes the same group
    /// twice.
    fn discount(&mut self, group: &EventGroup, newest_time: i64) -> bool;

    /// Whether the calculator takes part in counting at all
    fn is_active(&self) -> bool {
        self.window_size() > 0
    }
}

/// Window size plus the watermark of the last group a calculator evicted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    size: i64,
    last_discounted: Option<i64>,
}

impl WindowState {
    /// Create a window of `size` seconds with no evictions yet
    pub fn new(size: i64) -> Self {
        Self {
            size,
            last_discounted: None,
        }
    }

    /// Window size in seconds
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Time of the most recently discounted group
    pub fn watermark(&self) -> Option<i64> {
        self.last_discounted
    }

    /// Whether a group at `group_time` lies outside the window ending at
    /// `newest_time`
    pub fn excludes(&self, group_time: i64, newest_time: i64) -> bool {
        newest_time.saturating_sub(group_time) > self.size
    }

    /// Whether a group at `group_time` must be discounted now
    ///
    /// True only when the window excludes it and it lies strictly after the
    /// watermark. Deactivated windows never discount.
    pub fn should_discount(&self, group_time: i64, newest_time: i64) -> bool {
        self.size > 0
            && self.excludes(group_time, newest_time)
            && self.last_discounted.map_or(true, |mark| group_time > mark)
    }

    /// Check a group against the window and advance the watermark past it
    ///
    /// Returns true when the caller must remove the group's contribution.
    pub fn try_discount(&mut self, group_time: i64, newest_time: i64) -> bool {
        if !self.should_discount(group_time, newest_time) {
            return false;
        }
        self.last_discounted = Some(group_time);
        debug!(
            group_time,
            newest_time,
            window = self.size,
            "Removing outdated event group"
        );
        true
    }
}
