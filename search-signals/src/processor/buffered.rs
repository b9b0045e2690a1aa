//! Default signal processor: buffered saves, immediate deletes.

use std::sync::Arc;

use async_trait::async_trait;
use search_signals_repository::{BatchOperationSummary, IndexRegistry, SearchIndexProvider};
use search_signals_shared::{ModelInstance, ModelType};
use tracing::{debug, error, instrument, trace, warn};

use super::buffer::IndexBuffer;
use crate::errors::SignalError;
use crate::signals::SignalReceiver;

/// Signal processor that batches saved instances per model.
///
/// Saves of a managed model are appended to that model's buffer and sent to
/// the provider once the buffer reaches its threshold. Deletes go to the
/// provider immediately. Models the registry does not manage are ignored.
pub struct BufferedSignalProcessor {
    registry: Arc<dyn IndexRegistry>,
    provider: Arc<dyn SearchIndexProvider>,
    buffer: IndexBuffer,
}

impl BufferedSignalProcessor {
    /// Create a processor that flushes every `buffer_size` saves per model.
    pub fn new(
        registry: Arc<dyn IndexRegistry>,
        provider: Arc<dyn SearchIndexProvider>,
        buffer_size: usize,
    ) -> Self {
        Self {
            registry,
            provider,
            buffer: IndexBuffer::new(buffer_size),
        }
    }

    /// The pending-instance buffer.
    pub fn buffer(&self) -> &IndexBuffer {
        &self.buffer
    }

    /// Whether the registry manages `model`.
    ///
    /// A not-managed lookup failure means "no"; any other failure is an error.
    fn is_managed(&self, model: &ModelType) -> Result<bool, SignalError> {
        match self.registry.get_index(model) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_managed() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Send a batch to the index. On failure the batch goes back into the
    /// buffer so the next flush retries it.
    async fn flush_batch(
        &self,
        model: &ModelType,
        batch: Vec<ModelInstance>,
    ) -> Result<usize, SignalError> {
        let count = batch.len();
        debug!(model = %model, count = count, "Flushing buffered instances to search index");

        match self
            .provider
            .update_index(&batch, model.name(), self.buffer.threshold())
            .await
        {
            Ok(summary) => {
                log_summary(model, &summary);
                Ok(count)
            }
            Err(e) => {
                error!(model = %model, count = count, error = %e, "Failed to update search index");
                self.buffer.requeue(model, batch).await;
                Err(e.into())
            }
        }
    }
}

fn log_summary(model: &ModelType, summary: &BatchOperationSummary) {
    if summary.failed == 0 {
        debug!(model = %model, count = summary.succeeded, "Indexed all buffered instances");
        return;
    }

    warn!(
        model = %model,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Index update completed with some failures"
    );
    for result in summary.results.iter().filter(|r| !r.success) {
        if let Some(ref err) = result.error {
            error!(model = %model, pk = %result.pk, error = %err, "Failed to index instance");
        }
    }
}

#[async_trait]
impl SignalReceiver for BufferedSignalProcessor {
    #[instrument(skip(self, sender, instance), fields(sender = %sender, pk = %instance.pk))]
    async fn post_save_connector(
        &self,
        sender: &ModelType,
        instance: &ModelInstance,
    ) -> Result<(), SignalError> {
        if !self.is_managed(sender)? {
            trace!("Model is not managed, skipping save");
            return Ok(());
        }

        if let Some(batch) = self.buffer.add(sender, instance.clone()).await {
            self.flush_batch(sender, batch).await?;
        }
        Ok(())
    }

    #[instrument(skip(self, sender, instance), fields(sender = %sender, pk = %instance.pk))]
    async fn pre_delete_connector(
        &self,
        sender: &ModelType,
        instance: &ModelInstance,
    ) -> Result<(), SignalError> {
        if !self.is_managed(sender)? {
            trace!("Model is not managed, skipping delete");
            return Ok(());
        }

        self.provider
            .delete_index_item(instance, sender.name())
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to delete instance from search index");
                SignalError::from(e)
            })
    }

    /// Flush every model's buffer. A failing model does not stop the others;
    /// the first error is returned after all models were attempted.
    async fn flush_pending(&self) -> Result<usize, SignalError> {
        let mut flushed = 0;
        let mut first_error = None;

        for (model, batch) in self.buffer.flush_all().await {
            match self.flush_batch(&model, batch).await {
                Ok(count) => flushed += count,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(flushed),
        }
    }
}
