//! Consumer module for lifecycle events.
//!
//! Reads lifecycle events from an external source and hands them to the
//! orchestrator over a channel.

mod json_lines;
mod messages;

pub use json_lines::JsonLinesConsumer;
pub use messages::{LifecycleEvent, StreamMessage};

use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::errors::IngestError;

/// A source of lifecycle events.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Read events and send them until the source ends or `shutdown` fires.
    ///
    /// Implementations send [`StreamMessage::End`] when the source is exhausted.
    async fn run(
        &self,
        sender: mpsc::Sender<StreamMessage>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), IngestError>;
}
