//! Processor selection.
//!
//! Processors are registered under a name at startup; the `signal_class`
//! setting picks one by that name. The buffered processor is always
//! registered as [`DEFAULT_PROCESSOR_NAME`] and is used when no name is set.

use std::collections::HashMap;
use std::sync::Arc;

use search_signals_repository::{IndexRegistry, SearchIndexProvider};
use tracing::info;

use super::buffered::BufferedSignalProcessor;
use super::SignalProcessor;
use crate::config::SignalSettings;
use crate::errors::SignalError;
use crate::signals::{SignalBus, SignalReceiver};

/// Name reported for the built-in buffered processor.
pub const DEFAULT_PROCESSOR_NAME: &str = "buffered";

/// Everything a processor factory may need to build a receiver.
#[derive(Clone)]
pub struct ProcessorContext {
    pub settings: SignalSettings,
    pub registry: Arc<dyn IndexRegistry>,
    pub provider: Arc<dyn SearchIndexProvider>,
    pub bus: Arc<SignalBus>,
}

/// Builds a signal receiver from the processor context.
pub type ProcessorFactory =
    Box<dyn Fn(&ProcessorContext) -> Arc<dyn SignalReceiver> + Send + Sync>;

/// Named processor factories, populated at startup.
pub struct ProcessorFactories {
    factories: HashMap<String, ProcessorFactory>,
}

impl Default for ProcessorFactories {
    fn default() -> Self {
        let mut factories = Self {
            factories: HashMap::new(),
        };
        factories.register(DEFAULT_PROCESSOR_NAME, buffered_processor);
        factories
    }
}

fn buffered_processor(context: &ProcessorContext) -> Arc<dyn SignalReceiver> {
    Arc::new(BufferedSignalProcessor::new(
        context.registry.clone(),
        context.provider.clone(),
        context.settings.buffer_size(),
    ))
}

impl ProcessorFactories {
    /// Create a factory registry holding only the buffered processor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ProcessorContext) -> Arc<dyn SignalReceiver> + Send + Sync + 'static,
    {
        self.factories.insert(name.into(), Box::new(factory));
        self
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn get(&self, name: &str) -> Option<&ProcessorFactory> {
        self.factories.get(name)
    }
}

/// Instantiate the signal processor selected by the settings.
///
/// # Returns
///
/// * `Ok(SignalProcessor)` - The configured processor, or the buffered one
/// * `Err(SignalError::UnknownProcessor)` - If `signal_class` names no registered factory
pub fn get_signal_processor(
    context: ProcessorContext,
    factories: &ProcessorFactories,
) -> Result<SignalProcessor, SignalError> {
    let name = context
        .settings
        .signal_class
        .clone()
        .unwrap_or_else(|| DEFAULT_PROCESSOR_NAME.to_string());

    let factory = factories.get(&name).ok_or_else(|| {
        SignalError::unknown_processor(format!(
            "'{}' (registered: {:?})",
            name,
            factories.names()
        ))
    })?;
    let receiver = factory(&context);

    info!(
        processor = %name,
        buffer_size = context.settings.buffer_size(),
        "Signal processor selected"
    );

    Ok(SignalProcessor::new(name, receiver, context.bus, context.registry))
}
