//! Event model shared by the buffer, the window store and the calculators
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

// Export the builder for tests and embedders
pub use builder::WebTrafficEventBuilder;

/// Module with the web traffic event builder
pub mod builder;

/// Event priority, ordered from least to most urgent
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Informational
    Low,
    /// Regular traffic and periodic reports
    #[default]
    Medium,
    /// Alerts that operators should look at
    High,
    /// Alerts that need immediate attention
    Severe,
}

/// A timestamped occurrence
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    /// Epoch seconds
    pub time: i64,
    /// Human readable description
    pub message: String,
    /// Urgency of the event
    pub priority: Priority,
}

impl Event {
    /// Create a new event
    pub fn new(time: i64, message: impl Into<String>, priority: Priority) -> Self {
        Self {
            time,
            message: message.into(),
            priority,
        }
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.priority.cmp(&other.priority))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.time, self.message)
    }
}

/// One HTTP access-log record
///
/// Produced by the record parser; the analytics core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WebTrafficEvent {
    /// Time, message and priority
    pub event: Event,
    /// RFC 931 client identity
    pub client_identity: String,
    /// Authenticated remote user
    pub remote_user: String,
    /// Remote host that issued the request
    pub source: String,
    /// Raw request line, e.g. `GET /api/user HTTP/1.0`
    pub request_line: String,
    /// HTTP status code as logged
    pub status: String,
    /// Response size as logged
    pub size: String,
    /// First path segment of the request, e.g. `/api`
    pub section: String,
}

impl WebTrafficEvent {
    /// Get event timestamp
    pub fn time(&self) -> i64 {
        self.event.time
    }
}

impl Ord for WebTrafficEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.event
            .cmp(&other.event)
            .then_with(|| self.source.cmp(&other.source))
            .then_with(|| self.section.cmp(&other.section))
            .then_with(|| self.request_line.cmp(&other.request_line))
            .then_with(|| self.client_identity.cmp(&other.client_identity))
            .then_with(|| self.remote_user.cmp(&other.remote_user))
            .then_with(|| self.status.cmp(&other.status))
            .then_with(|| self.size.cmp(&other.size))
    }
}

impl PartialOrd for WebTrafficEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for WebTrafficEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} from {}",
            self.event.time, self.request_line, self.status, self.source
        )
    }
}

/// Events sharing one exact timestamp
///
/// The atomic unit of buffering, storage and eviction. A group is never split
/// once formed; it can only grow by merging events with the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventGroup {
    time: i64,
    events: Vec<WebTrafficEvent>,
}

impl EventGroup {
    /// Start a group from its first event
    pub fn new(first: WebTrafficEvent) -> Self {
        Self {
            time: first.time(),
            events: vec![first],
        }
    }

    /// Shared time of every event in the group
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Number of events in the group
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the group holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Iterate over the events in arrival order
    pub fn iter(&self) -> std::slice::Iter<'_, WebTrafficEvent> {
        self.events.iter()
    }

    /// Borrow the events
    pub fn events(&self) -> &[WebTrafficEvent] {
        &self.events
    }

    /// Append an event with the same time
    ///
    /// Returns the event back if its time differs from the group's.
    pub fn push(&mut self, event: WebTrafficEvent) -> Result<(), WebTrafficEvent> {
        if event.time() != self.time {
            return Err(event);
        }
        self.events.push(event);
        Ok(())
    }

    /// Absorb another group with the same time
    pub fn merge(&mut self, other: EventGroup) -> Result<(), EventGroup> {
        if other.time != self.time {
            return Err(other);
        }
        self.events.extend(other.events);
        Ok(())
    }
}

impl<'a> IntoIterator for &'a EventGroup {
    type Item = &'a WebTrafficEvent;
    type IntoIter = std::slice::Iter<'a, WebTrafficEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Input accepted by a processor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A parsed log record
    Event(WebTrafficEvent),
    /// No more records will arrive for now; release anything buffered
    EndOfStream,
}

impl From<WebTrafficEvent> for Input {
    fn from(event: WebTrafficEvent) -> Self {
        Input::Event(event)
    }
}
