//! Reorder buffer for events arriving slightly out of time order

use crate::event::{EventGroup, WebTrafficEvent};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use thiserror::Error;
use tracing::debug;

/// Default number of seconds an event may arrive behind the newest one
pub const DEFAULT_LATENESS_TOLERANCE: i64 = 2;

/// An event older than the last released group
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("event at {time} arrived after the group at {last_released} was released")]
pub struct LateArrival {
    /// Time of the rejected event
    pub time: i64,
    /// Time of the most recently released group
    pub last_released: i64,
    /// The rejected event
    pub event: Box<WebTrafficEvent>,
}

/// Min-heap of pending events released in time order, grouped by exact time
#[derive(Debug)]
pub struct IngestionBuffer {
    /// Pending events, earliest first
    pending: BinaryHeap<Reverse<WebTrafficEvent>>,
    /// Reorder tolerance in seconds
    tolerance: i64,
    /// Highest time ever submitted
    newest_submitted: Option<i64>,
    /// Time of the most recently released group
    last_released: Option<i64>,
}

impl IngestionBuffer {
    /// Create a buffer tolerating `tolerance` seconds of disorder
    pub fn new(tolerance: i64) -> Self {
        Self {
            pending: BinaryHeap::new(),
            tolerance: tolerance.max(0),
            newest_submitted: None,
            last_released: None,
        }
    }

    /// Reorder tolerance in seconds
    pub fn tolerance(&self) -> i64 {
        self.tolerance
    }

    /// Number of events waiting for release
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is waiting for release
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Time of the most recently released group
    pub fn last_released(&self) -> Option<i64> {
        self.last_released
    }

    /// Earliest pending time
    pub fn earliest_pending(&self) -> Option<i64> {
        self.pending.peek().map(|Reverse(e)| e.time())
    }

    /// Accept an event and release every group that can no longer be
    /// reordered
    ///
    /// Events strictly older than the last released group are rejected.
    /// Events tied with it are accepted.
    pub fn submit(&mut self, event: WebTrafficEvent) -> Result<Vec<EventGroup>, LateArrival> {
        let time = event.time();
        if let Some(last_released) = self.last_released.filter(|&last| time < last) {
            return Err(LateArrival {
                time,
                last_released,
                event: Box::new(event),
            });
        }

        let newest = self.newest_submitted.map_or(time, |n| n.max(time));
        self.newest_submitted = Some(newest);
        self.pending.push(Reverse(event));

        let tolerance = self.tolerance;
        let released =
            self.release_while(move |earliest| newest.saturating_sub(earliest) > tolerance);
        if released.is_empty() {
            debug!(time, pending = self.pending.len(), "Buffered event");
        }
        Ok(released)
    }

    /// Release everything pending regardless of tolerance
    pub fn flush(&mut self) -> Vec<EventGroup> {
        self.release_while(|_| true)
    }

    fn release_while(&mut self, ready: impl Fn(i64) -> bool) -> Vec<EventGroup> {
        let mut groups: Vec<EventGroup> = Vec::new();

        while let Some(earliest) = self.earliest_pending() {
            if !ready(earliest) {
                break;
            }
            let Some(Reverse(event)) = self.pending.pop() else {
                break;
            };
            debug!(time = event.time(), "Released from buffer");
            match groups.last_mut() {
                Some(group) if group.time() == event.time() => {
                    // Same time, cannot fail
                    let _ = group.push(event);
                }
                _ => groups.push(EventGroup::new(event)),
            }
        }

        if let Some(last) = groups.last() {
            self.last_released = Some(last.time());
        }
        groups
    }
}

impl Default for IngestionBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LATENESS_TOLERANCE)
    }
}
