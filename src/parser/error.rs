use thiserror::Error;

/// Reasons a log record is rejected before it reaches the analytics core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Record does not have exactly the expected number of fields
    #[error("expected {expected} fields, found {found}", expected = super::FIELD_COUNT)]
    FieldCount {
        /// Number of fields found
        found: usize,
    },

    /// Quoting is broken somewhere in the record
    #[error("malformed field near: {0}")]
    MalformedField(String),

    /// Request line has no parseable section
    #[error("malformed section in request: {0}")]
    Section(String),

    /// Timestamp is not a valid epoch second
    #[error("malformed timestamp: {0}")]
    Timestamp(String),
}
