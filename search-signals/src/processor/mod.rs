//! Signal processors.
//!
//! A [`SignalProcessor`] ties a receiver to the signal bus: `setup` connects
//! its post-save and pre-delete connectors for a selection of models and
//! `teardown` disconnects them again.

mod buffer;
mod buffered;
mod factory;

pub use buffer::IndexBuffer;
pub use buffered::BufferedSignalProcessor;
pub use factory::{
    get_signal_processor, ProcessorContext, ProcessorFactories, ProcessorFactory,
    DEFAULT_PROCESSOR_NAME,
};

use std::sync::Arc;

use search_signals_repository::IndexRegistry;
use search_signals_shared::ModelType;
use tracing::{info, instrument, warn};

use crate::errors::SignalError;
use crate::signals::{Signal, SignalBus, SignalReceiver};

/// Which models `setup` and `teardown` act on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ModelSelection {
    /// Nothing selected.
    #[default]
    None,
    /// A single model.
    Model(ModelType),
    /// Every model the index registry manages.
    AllManaged,
    /// An explicit list of models.
    Models(Vec<ModelType>),
}

impl ModelSelection {
    /// Expand the selection into concrete model types.
    pub fn resolve(&self, registry: &dyn IndexRegistry) -> Result<Vec<ModelType>, SignalError> {
        match self {
            Self::None => Ok(Vec::new()),
            Self::Model(model) => Ok(vec![model.clone()]),
            Self::AllManaged => Ok(registry.managed_models()?),
            Self::Models(models) => Ok(models.clone()),
        }
    }
}

/// A receiver together with the bus it is wired to.
pub struct SignalProcessor {
    name: String,
    receiver: Arc<dyn SignalReceiver>,
    bus: Arc<SignalBus>,
    registry: Arc<dyn IndexRegistry>,
}

impl SignalProcessor {
    /// Wrap a receiver.
    pub fn new(
        name: impl Into<String>,
        receiver: Arc<dyn SignalReceiver>,
        bus: Arc<SignalBus>,
        registry: Arc<dyn IndexRegistry>,
    ) -> Self {
        Self {
            name: name.into(),
            receiver,
            bus,
            registry,
        }
    }

    /// Name the processor was selected by.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The receiver connected to the bus.
    pub fn receiver(&self) -> &Arc<dyn SignalReceiver> {
        &self.receiver
    }

    /// The bus the receiver is connected to.
    pub fn bus(&self) -> &Arc<SignalBus> {
        &self.bus
    }

    /// Connect both connectors for every selected model.
    ///
    /// Returns the number of models wired.
    #[instrument(skip(self), fields(processor = %self.name))]
    pub async fn setup(&self, selection: &ModelSelection) -> Result<usize, SignalError> {
        let models = selection.resolve(self.registry.as_ref())?;
        if models.is_empty() {
            warn!("No models selected, no signals connected");
        }

        for model in &models {
            self.bus
                .connect(Signal::PostSave, self.receiver.clone(), model)
                .await;
            self.bus
                .connect(Signal::PreDelete, self.receiver.clone(), model)
                .await;
        }

        info!(model_count = models.len(), "Signal processor set up");
        Ok(models.len())
    }

    /// Disconnect both connectors for every selected model.
    ///
    /// Returns the number of models unwired.
    #[instrument(skip(self), fields(processor = %self.name))]
    pub async fn teardown(&self, selection: &ModelSelection) -> Result<usize, SignalError> {
        let models = selection.resolve(self.registry.as_ref())?;

        for model in &models {
            self.bus
                .disconnect(Signal::PostSave, &self.receiver, model)
                .await;
            self.bus
                .disconnect(Signal::PreDelete, &self.receiver, model)
                .await;
        }

        info!(model_count = models.len(), "Signal processor torn down");
        Ok(models.len())
    }

    /// Push out instances the receiver is still buffering.
    pub async fn flush_pending(&self) -> Result<usize, SignalError> {
        self.receiver.flush_pending().await
    }
}
