/// Error types for the logs monitor
use thiserror::Error;

pub use crate::parser::error::RecordError;

/// Main error type for monitor operations
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Configuration is invalid or incomplete
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Configuration file could not be deserialized
    #[error("Config file error: {0}")]
    ConfigFile(#[from] serde_yaml::Error),

    /// A log record could not be turned into an event
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for monitor operations
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Error chain helper for adding context
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, msg: impl Into<String>) -> Result<T>;
}

impl<T> ErrorContext<T> for Result<T> {
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| MonitorError::Configuration(format!("{}: {}", msg.into(), e)))
    }
}
