//! Notification sinks for alerts and reports

use crate::event::{Event, Priority};
use chrono::DateTime;
use parking_lot::Mutex;
use std::io::Write;

const HEADER_WIDTH: usize = 80;
const TITLE: &str = "Logs Monitor";

/// Receives alert and report events produced by the calculators
///
/// Invoked synchronously on the event-processing path, so implementations
/// must return quickly.
pub trait Notifier: Send + Sync {
    /// Take action on an event
    fn notify(&self, event: &Event);
}

/// Prints events as lines on the terminal
pub struct TerminalNotifier {
    colored: bool,
    out: Mutex<Box<dyn Write + Send>>,
}

impl TerminalNotifier {
    /// Print to stdout with colors
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()), true)
    }

    /// Print to any writer
    pub fn with_writer(out: Box<dyn Write + Send>, colored: bool) -> Self {
        Self {
            colored,
            out: Mutex::new(out),
        }
    }

    /// Print the banner shown once at startup
    pub fn print_header(&self) {
        use yansi::Paint;

        let border = "=".repeat(HEADER_WIDTH);
        let title = format!("{:^width$}", TITLE, width = HEADER_WIDTH - 2);
        let title = if self.colored {
            title.bold().to_string()
        } else {
            title
        };
        let mut out = self.out.lock();
        // Terminal output is best effort
        let _ = writeln!(out, "{border}\n|{title}|\n{border}");
        let _ = out.flush();
    }

    /// Render one event as a terminal line
    pub fn render(&self, event: &Event) -> String {
        use yansi::Paint;

        let time = format_time(event.time);
        if !self.colored {
            return format!("{} - {}", time, event.message);
        }
        if event.priority > Priority::Medium {
            format!("{} - {}", time.red().bold(), event.message)
        } else {
            format!("{} - {}", time.bold(), event.message)
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, event: &Event) {
        let line = self.render(event);
        let mut out = self.out.lock();
        let _ = writeln!(out, "{line}");
        let _ = out.flush();
    }
}

/// Keeps every notified event in memory
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<Event>>,
}

impl RecordingNotifier {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    /// Number of events received so far
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing was received
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<Event> {
        self.events.lock().last().cloned()
    }

    /// Drop everything received so far
    pub fn clear(&self) {
        Vec::clear(&mut self.events.lock());
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}

/// Render epoch seconds as a UTC timestamp, falling back to the raw number
pub fn format_time(time: i64) -> String {
    DateTime::from_timestamp(time, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| time.to_string())
}
