//! Domain-specific error types for kafka-replay

use thiserror::Error;

/// Structured framing error domain
///
/// Any of these aborts the session that hit it. The container cursor is not
/// guaranteed to sit on a record boundary afterwards.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// The byte source ended inside a header or record
    #[error("truncated {field}: expected {expected} bytes, got {got}")]
    Truncated {
        field: &'static str,
        expected: usize,
        got: usize,
    },
    /// A length field is negative or above the per-field bound
    #[error("invalid {field}: {size} bytes (allowed 0..={max})")]
    SizeOutOfBounds {
        field: &'static str,
        size: i64,
        max: i64,
    },
    #[error("unsupported protocol version: {0} (supported versions: 1, 2)")]
    UnsupportedVersion(i32),
}

impl FramingError {
    pub fn truncated(field: &'static str, expected: usize, got: usize) -> Self {
        Self::Truncated {
            field,
            expected,
            got,
        }
    }

    pub fn size_out_of_bounds(field: &'static str, size: i64, max: i64) -> Self {
        Self::SizeOutOfBounds { field, size, max }
    }
}

/// Structured source error domain
#[derive(Debug, Error, Clone)]
pub enum SourceError {
    #[error("{operation}: {detail}")]
    Operation { operation: String, detail: String },
    /// The source cannot honor an absolute position in its current mode
    #[error("seek not supported: {0}")]
    SeekUnsupported(String),
    /// The source has been closed and will yield nothing further
    #[error("source closed")]
    Closed,
    #[error("{0}")]
    Message(String),
}

impl SourceError {
    pub fn operation(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Operation {
            operation: operation.into(),
            detail: detail.into(),
        }
    }
}

impl From<String> for SourceError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for SourceError {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

/// Structured sink error domain
#[derive(Debug, Error, Clone)]
pub enum SinkError {
    #[error("{operation}: {detail}")]
    Operation { operation: String, detail: String },
    /// A batch was rejected; nothing from it should be assumed delivered
    #[error("batch of {records} records rejected: {reason}")]
    BatchRejected { records: usize, reason: String },
    #[error("{0}")]
    Message(String),
}

impl SinkError {
    pub fn operation(operation: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Operation {
            operation: operation.into(),
            detail: detail.into(),
        }
    }

    pub fn batch_rejected(records: usize, reason: impl Into<String>) -> Self {
        Self::BatchRejected {
            records,
            reason: reason.into(),
        }
    }
}

impl From<String> for SinkError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}

impl From<&str> for SinkError {
    fn from(value: &str) -> Self {
        Self::Message(value.to_string())
    }
}

/// Structured configuration error domain
#[derive(Debug, Error, Clone)]
pub enum ConfigError {
    #[error("{setting}: {reason}")]
    InvalidSetting { setting: String, reason: String },
    #[error("failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
    #[error("{0}")]
    Message(String),
}

impl ConfigError {
    pub fn invalid_setting(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            setting: setting.into(),
            reason: reason.into(),
        }
    }

    pub fn parse(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl From<String> for ConfigError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
