//! Reading access logs from a file, once or continuously

use crate::consumer::Processor;
use crate::error::Result;
use crate::event::Input;
use crate::parser::{is_header, parse_record};
use std::fs::File;
use std::future::Future;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::ops::AddAssign;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Default delay between two reads in follow mode
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Log reader configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Path of the access log
    pub path: PathBuf,
    /// Keep watching the file for appended records
    pub follow: bool,
    /// Delay between two reads in follow mode
    pub poll_interval: Duration,
}

impl ReaderConfig {
    /// Read `path` once
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            follow: false,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Set follow mode
    pub fn follow(mut self, follow: bool) -> Self {
        self.follow = follow;
        self
    }

    /// Set the polling delay used in follow mode
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Counters for one or more reads
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Non-empty lines read, header included
    pub lines: u64,
    /// Records handed to the processor
    pub accepted: u64,
    /// Records dropped as malformed
    pub malformed: u64,
}

impl AddAssign for ReadOutcome {
    fn add_assign(&mut self, other: Self) {
        self.lines += other.lines;
        self.accepted += other.accepted;
        self.malformed += other.malformed;
    }
}

/// Reads records from an access log and feeds them to a processor
#[derive(Debug)]
pub struct LogReader {
    config: ReaderConfig,
    /// Byte offset just past the last complete line handled
    position: u64,
}

impl LogReader {
    /// Create a reader starting at the beginning of the file
    pub fn new(config: ReaderConfig) -> Self {
        Self {
            config,
            position: 0,
        }
    }

    /// Reader configuration
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Byte offset the next read starts from
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Read every complete record appended since the last read
    ///
    /// In follow mode a trailing line without a newline is left for the next
    /// read, since the writer may still be producing it.
    pub fn read_available<P: Processor + ?Sized>(
        &mut self,
        processor: &mut P,
    ) -> Result<ReadOutcome> {
        let mut file = File::open(&self.config.path)?;
        let len = file.metadata()?.len();
        if len < self.position {
            warn!(
                "HTTP log file {} shrank from {} to {} bytes, reading from the start",
                self.config.path.display(),
                self.position,
                len
            );
            self.position = 0;
        }
        file.seek(SeekFrom::Start(self.position))?;

        let mut reader = BufReader::new(file);
        let mut outcome = ReadOutcome::default();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            let n = reader.read_until(b'\n', &mut buf)?;
            if n == 0 {
                break;
            }
            if self.config.follow && !buf.ends_with(b"\n") {
                debug!("Partial line at end of file, waiting for the rest");
                break;
            }
            self.position += n as u64;
            let line = String::from_utf8_lossy(&buf);
            self.handle_line(&line, processor, &mut outcome);
        }

        if outcome.lines == 0 {
            debug!("Nothing further to read");
        }
        Ok(outcome)
    }

    fn handle_line<P: Processor + ?Sized>(
        &self,
        line: &str,
        processor: &mut P,
        outcome: &mut ReadOutcome,
    ) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }
        outcome.lines += 1;
        if is_header(line) {
            debug!("Header: {}", line);
            return;
        }
        match parse_record(line) {
            Ok(event) => {
                processor.consume(Input::Event(event));
                outcome.accepted += 1;
            }
            Err(e) => {
                warn!("Malformed record ({}): {}", e, line);
                outcome.malformed += 1;
            }
        }
    }

    /// Read the whole file, then signal end of stream
    pub fn run_once<P: Processor + ?Sized>(&mut self, processor: &mut P) -> Result<ReadOutcome> {
        info!("Monitoring HTTP log file {}", self.config.path.display());
        let outcome = self.read_available(processor)?;
        processor.consume(Input::EndOfStream);
        info!(
            lines = outcome.lines,
            accepted = outcome.accepted,
            malformed = outcome.malformed,
            "Finished reading HTTP log file"
        );
        Ok(outcome)
    }

    /// Keep reading appended records until `shutdown` resolves, then signal
    /// end of stream
    ///
    /// A missing or unreadable file is logged and retried on the next poll.
    pub async fn follow<P, F>(&mut self, processor: &mut P, shutdown: F) -> ReadOutcome
    where
        P: Processor + ?Sized,
        F: Future<Output = ()>,
    {
        info!(
            "Following HTTP log file {} every {:?}",
            self.config.path.display(),
            self.config.poll_interval
        );
        tokio::pin!(shutdown);

        let mut total = ReadOutcome::default();
        loop {
            match self.read_available(processor) {
                Ok(outcome) => total += outcome,
                Err(e) => error!(
                    "Cannot read HTTP log file {}: {}",
                    self.config.path.display(),
                    e
                ),
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        processor.consume(Input::EndOfStream);
        info!(
            lines = total.lines,
            accepted = total.accepted,
            malformed = total.malformed,
            "Stopped following HTTP log file"
        );
        total
    }
}
