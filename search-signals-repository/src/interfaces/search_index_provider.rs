//! Search index provider trait definition.
//!
//! This module defines the abstract interface for the index writes issued by
//! the signal processor, allowing for different backend implementations.

use async_trait::async_trait;
use search_signals_shared::ModelInstance;

use crate::errors::SearchIndexError;
use crate::types::BatchOperationSummary;

/// Abstracts the underlying search index implementation (OpenSearch, Elasticsearch, etc.).
///
/// Implementations are injected into the signal processor. All methods return
/// `Result<T, SearchIndexError>` for consistent error handling across backends.
#[async_trait]
pub trait SearchIndexProvider: Send + Sync {
    /// Index (create or replace) a batch of instances of one model.
    ///
    /// # Arguments
    ///
    /// * `instances` - The instances to index
    /// * `model_name` - Name of the model the instances belong to
    /// * `batch_size` - Maximum number of documents sent per backend request
    ///
    /// # Returns
    ///
    /// * `Ok(BatchOperationSummary)` - Aggregate statistics and per-instance results
    /// * `Err(SearchIndexError)` - If the operation fails entirely
    async fn update_index(
        &self,
        instances: &[ModelInstance],
        model_name: &str,
        batch_size: usize,
    ) -> Result<BatchOperationSummary, SearchIndexError>;

    /// Remove a single instance from the index.
    ///
    /// If the document doesn't exist, the operation is considered successful.
    async fn delete_index_item(
        &self,
        instance: &ModelInstance,
        model_name: &str,
    ) -> Result<(), SearchIndexError>;
}
