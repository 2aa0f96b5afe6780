//! Error types for the status framework.

use bstatus_common::MarkupError;
use thiserror::Error;

/// Result type alias using [`StatusError`].
pub type Result<T> = std::result::Result<T, StatusError>;

/// Errors that can occur while configuring or running the status line.
#[derive(Error, Debug)]
pub enum StatusError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parse error.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration validation error.
    #[error("Configuration validation failed: {0}")]
    ConfigValidation(String),

    /// Rendering or writing the status line failed.
    #[error("Output error: {0}")]
    Output(String),

    /// A click or refresh named a source index that does not exist.
    #[error("No source at index {0}")]
    UnknownSource(usize),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Rich-text markup error.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StatusError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a configuration validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ConfigValidation(msg.into())
    }

    /// Create an output error.
    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output(msg.into())
    }
}

impl From<serde_json::Error> for StatusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<json5::Error> for StatusError {
    fn from(err: json5::Error) -> Self {
        Self::ConfigParse(err.to_string())
    }
}

impl From<bstatus_common::Error> for StatusError {
    fn from(err: bstatus_common::Error) -> Self {
        match err {
            bstatus_common::Error::Config(msg) => Self::Config(msg),
            bstatus_common::Error::Io(err) => Self::Io(err),
            bstatus_common::Error::Markup(err) => Self::Markup(err),
        }
    }
}

/// A sampler failed to produce a value.
///
/// Cloneable so a single failed sample can be shared through the snapshot
/// cache with every source waiting on it. Surfaced on the source's display
/// until the next tick.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SampleError {
    /// Reading a pseudo-file failed.
    #[error("{path}: {message}")]
    Io { path: String, message: String },

    /// A subprocess could not be run or exited unsuccessfully.
    #[error("{command}: {message}")]
    Command { command: String, message: String },

    /// Sampled data did not have the expected shape.
    #[error("Failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    /// A format string could not be applied.
    #[error("Invalid format: {0}")]
    Format(String),

    /// The rendered markup was rejected.
    #[error(transparent)]
    Markup(#[from] MarkupError),

    /// Invariant violation inside a sampler.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SampleError {
    /// Create a read failure for `path`.
    pub fn io(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    /// Create a subprocess failure.
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a parse failure.
    pub fn parse(what: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            what: what.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_error_display() {
        let err = SampleError::io(
            "/proc/stat",
            &std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.to_string(), "/proc/stat: missing");

        let err = SampleError::command("df", "exit status: 1");
        assert_eq!(err.to_string(), "df: exit status: 1");
    }

    #[test]
    fn test_common_error_conversion() {
        let err: StatusError = bstatus_common::Error::Config("bad".to_string()).into();
        assert!(matches!(err, StatusError::Config(_)));
    }
}
