//! # Search Signals
//!
//! Connects model save/delete lifecycle signals to a search index.
//!
//! ## Architecture
//!
//! 1. **Signals**: A publish-subscribe bus for `post_save` / `pre_delete` events
//! 2. **Processor**: Buffers saved instances per model and flushes them to the
//!    index in batches; forwards deletions immediately
//! 3. **Consumer**: Reads lifecycle events from a JSON-lines stream
//! 4. **Orchestrator**: Dispatches consumed events onto the bus
//!
//! ## Modules
//!
//! - [`config`]: Settings and dependency initialization
//! - [`signals`]: The signal bus and receiver trait
//! - [`processor`]: Signal processors, the index buffer and the processor factory registry
//! - [`consumer`]: JSON-lines lifecycle event consumer
//! - [`orchestrator`]: Coordinates consumer and bus
//! - [`errors`]: Error types

pub mod config;
pub mod consumer;
pub mod errors;
pub mod orchestrator;
pub mod processor;
pub mod signals;

pub use config::{Dependencies, SignalSettings};
pub use errors::{IngestError, SignalError};
pub use processor::{get_signal_processor, ModelSelection, SignalProcessor};
pub use signals::{Signal, SignalBus, SignalReceiver};

use thiserror::Error;

/// Errors that can occur during startup or while running the dispatcher.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Ingest error.
    #[error("Ingest error: {0}")]
    IngestError(#[from] IngestError),

    /// Signal error.
    #[error("Signal error: {0}")]
    SignalError(#[from] SignalError),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
