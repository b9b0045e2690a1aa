//! Lifecycle signals and the bus that dispatches them.
//!
//! Receivers subscribe to a signal for one sender model type. Sending a
//! signal calls every receiver subscribed for that signal and sender.

mod bus;

pub use bus::SignalBus;

use async_trait::async_trait;
use search_signals_shared::{ModelInstance, ModelType};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::SignalError;

/// Lifecycle events emitted for model instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// An instance was created or updated.
    PostSave,
    /// An instance is about to be deleted.
    PreDelete,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PostSave => f.write_str("post_save"),
            Self::PreDelete => f.write_str("pre_delete"),
        }
    }
}

/// Callback slots a receiver exposes to the bus.
///
/// The bus calls `post_save_connector` for [`Signal::PostSave`] and
/// `pre_delete_connector` for [`Signal::PreDelete`].
#[async_trait]
pub trait SignalReceiver: Send + Sync {
    /// Handle an instance that was saved.
    async fn post_save_connector(
        &self,
        sender: &ModelType,
        instance: &ModelInstance,
    ) -> Result<(), SignalError>;

    /// Handle an instance that is about to be deleted.
    async fn pre_delete_connector(
        &self,
        sender: &ModelType,
        instance: &ModelInstance,
    ) -> Result<(), SignalError>;

    /// Push out any work the receiver is holding back.
    ///
    /// Returns the number of instances written. Receivers without a buffer
    /// have nothing to flush.
    async fn flush_pending(&self) -> Result<usize, SignalError> {
        Ok(0)
    }
}
