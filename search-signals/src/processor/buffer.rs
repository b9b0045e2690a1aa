//! Per-model buffer of instances waiting to be indexed.

use std::collections::HashMap;

use search_signals_shared::{ModelInstance, ModelType};
use tokio::sync::Mutex;

/// Accumulates saved instances per model type until a threshold is reached.
///
/// Append, threshold check and drain happen under one lock, so concurrent
/// saves can neither lose instances nor flush the same instance twice.
#[derive(Debug)]
pub struct IndexBuffer {
    threshold: usize,
    pending: Mutex<HashMap<ModelType, Vec<ModelInstance>>>,
}

impl IndexBuffer {
    /// Create a buffer that releases a batch once `threshold` instances of a
    /// model are pending. A threshold of 0 is treated as 1.
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// The number of pending instances that triggers a flush.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Append an instance to its model's buffer.
    ///
    /// Returns the whole buffer, leaving it empty, once it holds at least
    /// `threshold` instances.
    pub async fn add(&self, model: &ModelType, instance: ModelInstance) -> Option<Vec<ModelInstance>> {
        let mut pending = self.pending.lock().await;
        let items = pending.entry(model.clone()).or_default();
        items.push(instance);

        if items.len() >= self.threshold {
            Some(std::mem::take(items))
        } else {
            None
        }
    }

    /// Put a batch back in front of whatever arrived since it was taken.
    pub async fn requeue(&self, model: &ModelType, mut batch: Vec<ModelInstance>) {
        let mut pending = self.pending.lock().await;
        let items = pending.entry(model.clone()).or_default();
        batch.append(items);
        *items = batch;
    }

    /// Drain every non-empty buffer.
    pub async fn flush_all(&self) -> Vec<(ModelType, Vec<ModelInstance>)> {
        let mut pending = self.pending.lock().await;
        pending
            .iter_mut()
            .filter(|(_, items)| !items.is_empty())
            .map(|(model, items)| (model.clone(), std::mem::take(items)))
            .collect()
    }

    /// Number of pending instances for a model.
    pub async fn len(&self, model: &ModelType) -> usize {
        self.pending.lock().await.get(model).map_or(0, Vec::len)
    }

    /// Number of pending instances across all models.
    pub async fn total_len(&self) -> usize {
        self.pending.lock().await.values().map(Vec::len).sum()
    }
}
