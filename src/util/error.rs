//! Error types for field averaging.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for field-file and averaging operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Working directory does not look like a simulation case
    #[error("Not a simulation case (missing system/ or constant/): {0}")]
    NotACase(PathBuf),

    /// Field name has no entry in the field table
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// Missing format declaration or unparseable point count
    #[error("Malformed header: {0}")]
    MalformedHeader(String),

    /// Payload length mismatch or missing closing delimiter
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Payload shape differs from the one already accumulated
    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    /// Nothing accumulated for the given field name
    #[error("No data accumulated for field: {0}")]
    NoData(String),

    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failure while processing one time step of a field
    #[error("{field} at time {time}: {source}")]
    TimeStep {
        field: String,
        time: String,
        #[source]
        source: Box<Error>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed header error.
    pub fn header(msg: impl Into<String>) -> Self {
        Self::MalformedHeader(msg.into())
    }

    /// Create a malformed payload error.
    pub fn payload(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// Wrap an error with the field and time step it happened on.
    pub fn at_time_step(self, field: &str, time: &str) -> Self {
        Self::TimeStep {
            field: field.to_string(),
            time: time.to_string(),
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping time-step context.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::TimeStep { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result type alias for field averaging operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::ShapeMismatch { expected: "2 x scalar".into(), actual: "3 x scalar".into() };
        assert!(e.to_string().contains("2 x scalar"));
        assert!(e.to_string().contains("3 x scalar"));

        let e = Error::header("no format line");
        assert!(e.to_string().contains("no format line"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_time_step_context() {
        let err = Error::payload("bad delimiter").at_time_step("U", "0.5");
        let msg = err.to_string();
        assert!(msg.contains("U"));
        assert!(msg.contains("0.5"));
        assert!(msg.contains("bad delimiter"));
        assert!(matches!(err.root_cause(), Error::MalformedPayload(_)));
    }
}
