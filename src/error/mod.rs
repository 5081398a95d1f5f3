//! Error types for kafka-replay
//!
//! This module defines the crate-wide error type. Framing failures, collaborator
//! failures and cancellation are kept as distinct variants so that callers can
//! tell a corrupt container apart from a broker hiccup or a user interrupt.

use thiserror::Error;

mod domain;

pub use domain::{ConfigError, FramingError, SinkError, SourceError};

/// Result type alias for kafka-replay operations
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Main error type for kafka-replay
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The session was stopped by its cancellation token.
    ///
    /// This is a clean termination; the accompanying session stats still
    /// describe the work completed before the signal arrived.
    #[error("Operation cancelled")]
    Cancelled,
}

impl ReplayError {
    /// Create a configuration error from an arbitrary message
    pub fn config_msg(msg: impl Into<String>) -> Self {
        ReplayError::Config(ConfigError::Message(msg.into()))
    }

    /// Create a source error from an arbitrary message
    pub fn source_msg(msg: impl Into<String>) -> Self {
        ReplayError::Source(SourceError::Message(msg.into()))
    }

    /// Create a sink error from an arbitrary message
    pub fn sink_msg(msg: impl Into<String>) -> Self {
        ReplayError::Sink(SinkError::Message(msg.into()))
    }

    /// Whether this error is the clean cancellation signal
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ReplayError::Cancelled)
    }

    /// Whether this error indicates a corrupt or unreadable container
    pub fn is_framing(&self) -> bool {
        matches!(self, ReplayError::Framing(_))
    }

    /// Returns the framing error, if this is one
    pub fn as_framing(&self) -> Option<&FramingError> {
        match self {
            ReplayError::Framing(e) => Some(e),
            _ => None,
        }
    }
}
