//! Message types for the consumer.
//!
//! Defines the event structures that flow from the consumer to the orchestrator.

use search_signals_shared::{ModelInstance, ModelType};
use serde::{Deserialize, Serialize};

use crate::signals::Signal;

/// A lifecycle event for one model instance.
///
/// On the wire this is one JSON object per line:
///
/// ```json
/// {"signal":"post_save","model":"Article","instance":{"pk":"1","fields":{"title":"Hello"}}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifecycleEvent {
    /// The signal to send.
    pub signal: Signal,
    /// The model type the instance belongs to.
    pub model: ModelType,
    /// The instance itself.
    pub instance: ModelInstance,
}

impl LifecycleEvent {
    /// Create a post-save event.
    pub fn post_save(model: impl Into<ModelType>, instance: ModelInstance) -> Self {
        Self {
            signal: Signal::PostSave,
            model: model.into(),
            instance,
        }
    }

    /// Create a pre-delete event.
    pub fn pre_delete(model: impl Into<ModelType>, instance: ModelInstance) -> Self {
        Self {
            signal: Signal::PreDelete,
            model: model.into(),
            instance,
        }
    }
}

/// Messages sent from a consumer to the orchestrator.
#[derive(Debug)]
pub enum StreamMessage {
    /// A lifecycle event to dispatch.
    Event(LifecycleEvent),
    /// An input record could not be used.
    Error(String),
    /// Stream has ended.
    End,
}
