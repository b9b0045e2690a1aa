//! Error types for the signal dispatcher.

use search_signals_repository::SearchIndexError;
use thiserror::Error;

/// Errors raised while handling lifecycle signals.
#[derive(Error, Debug)]
pub enum SignalError {
    /// Error from the index registry or the search index provider.
    #[error("Index error: {0}")]
    IndexError(#[from] SearchIndexError),

    /// The configured processor name has no registered factory.
    #[error("Unknown signal processor: {0}")]
    UnknownProcessor(String),
}

impl SignalError {
    /// Create an unknown processor error.
    pub fn unknown_processor(name: impl Into<String>) -> Self {
        Self::UnknownProcessor(name.into())
    }
}

/// Errors that can occur while ingesting lifecycle events.
#[derive(Error, Debug)]
pub enum IngestError {
    /// Error reading from the event source.
    #[error("Consumer error: {0}")]
    ConsumerError(String),

    /// Error parsing or decoding an event.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Error wiring or flushing signal handlers.
    #[error("Signal error: {0}")]
    SignalError(#[from] SignalError),
}

impl IngestError {
    /// Create a consumer error.
    pub fn consumer(msg: impl Into<String>) -> Self {
        Self::ConsumerError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::ConsumerError(err.to_string())
    }
}
