//! OpenSearch provider implementation.
//!
//! This module provides the concrete implementation of `SearchIndexProvider`
//! using the OpenSearch Rust crate.

use std::sync::Arc;

use async_trait::async_trait;
use opensearch::{
    http::request::JsonBody,
    http::transport::{SingleNodeConnectionPool, TransportBuilder},
    BulkParts, DeleteParts, OpenSearch,
};
use search_signals_shared::ModelInstance;
use serde_json::{json, Value};
use tracing::{debug, error, info};
use url::Url;

use crate::errors::SearchIndexError;
use crate::interfaces::{IndexRegistry, SearchIndexProvider};
use crate::types::{BatchOperationResult, BatchOperationSummary, ModelIndex};

/// OpenSearch provider implementation.
///
/// Resolves the target index of each model through the injected registry and
/// writes documents keyed by the instance primary key.
///
/// # Example
///
/// ```ignore
/// let registry: StaticIndexRegistry = "catalog=Article".parse()?;
/// let provider = OpenSearchProvider::new("http://localhost:9200", Arc::new(registry)).await?;
///
/// let instance = ModelInstance::new("1").with_field("title", "Hello");
/// provider.update_index(&[instance], "Article", 100).await?;
/// ```
pub struct OpenSearchProvider {
    client: OpenSearch,
    registry: Arc<dyn IndexRegistry>,
}

impl OpenSearchProvider {
    /// Create a new OpenSearch provider connected to the specified URL.
    ///
    /// # Arguments
    ///
    /// * `url` - The OpenSearch server URL (e.g., "http://localhost:9200")
    /// * `registry` - Registry used to resolve each model's index
    ///
    /// # Returns
    ///
    /// * `Ok(OpenSearchProvider)` - A new provider instance
    /// * `Err(SearchIndexError)` - If connection setup fails
    pub async fn new(
        url: &str,
        registry: Arc<dyn IndexRegistry>,
    ) -> Result<Self, SearchIndexError> {
        let parsed_url =
            Url::parse(url).map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let conn_pool = SingleNodeConnectionPool::new(parsed_url);
        let transport = TransportBuilder::new(conn_pool)
            .disable_proxy()
            .build()
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let client = OpenSearch::new(transport);

        info!(url = %url, indices = ?registry.get_indices(), "Created OpenSearch provider");

        Ok(Self { client, registry })
    }

    /// Check that the cluster answers.
    pub async fn ping(&self) -> Result<(), SearchIndexError> {
        let response = self
            .client
            .ping()
            .send()
            .await
            .map_err(|e| SearchIndexError::connection(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            return Err(SearchIndexError::connection(format!(
                "Ping failed with status {}",
                status
            )));
        }
        Ok(())
    }

    /// Build the `_bulk` request body for a chunk of instances.
    ///
    /// Each instance contributes an action line and a source line.
    fn bulk_body(model_index: &ModelIndex, instances: &[ModelInstance]) -> Vec<JsonBody<Value>> {
        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(instances.len() * 2);
        for instance in instances {
            body.push(json!({ "index": { "_id": instance.pk } }).into());
            body.push(model_index.serialize_object(instance).into());
        }
        body
    }

    /// Turn a `_bulk` response into per-instance results.
    ///
    /// Items are matched to instances by position, which is how OpenSearch
    /// orders them. Instances without a matching item count as failed.
    fn summarize_bulk_response(response: &Value, instances: &[ModelInstance]) -> BatchOperationSummary {
        let items = response
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let results = instances
            .iter()
            .enumerate()
            .map(|(position, instance)| {
                let action = items.get(position).and_then(|item| item.get("index"));
                let error = match action {
                    None => Some(SearchIndexError::bulk_index("Missing item in bulk response")),
                    Some(action) => action
                        .get("error")
                        .map(|err| SearchIndexError::bulk_index(err.to_string())),
                };
                BatchOperationResult {
                    pk: instance.pk.clone(),
                    success: error.is_none(),
                    error,
                }
            })
            .collect();

        BatchOperationSummary::from_results(results)
    }

    /// Send one `_bulk` request.
    async fn bulk_index_chunk(
        &self,
        model_index: &ModelIndex,
        chunk: &[ModelInstance],
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        let response = self
            .client
            .bulk(BulkParts::Index(model_index.index()))
            .body(Self::bulk_body(model_index, chunk))
            .send()
            .await
            .map_err(|e| SearchIndexError::bulk_index(e.to_string()))?;

        let status = response.status_code();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Bulk request failed");
            return Err(SearchIndexError::bulk_index(format!(
                "Bulk request failed with status {}: {}",
                status, error_body
            )));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| SearchIndexError::parse(e.to_string()))?;

        Ok(Self::summarize_bulk_response(&body, chunk))
    }
}

#[async_trait]
impl SearchIndexProvider for OpenSearchProvider {
    /// Index instances in `_bulk` requests of at most `batch_size` documents.
    ///
    /// A failed request aborts the remaining chunks; per-document failures
    /// inside a successful request are reported in the summary.
    async fn update_index(
        &self,
        instances: &[ModelInstance],
        model_name: &str,
        batch_size: usize,
    ) -> Result<BatchOperationSummary, SearchIndexError> {
        if batch_size == 0 {
            return Err(SearchIndexError::validation("Batch size must be at least 1"));
        }

        let model_index = self.registry.get_model_index(model_name)?;
        let mut summary = BatchOperationSummary::default();

        for chunk in instances.chunks(batch_size) {
            summary.merge(self.bulk_index_chunk(&model_index, chunk).await?);
        }

        debug!(
            model = %model_name,
            index = %model_index.index(),
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Bulk indexed instances"
        );
        Ok(summary)
    }

    /// Delete the document for an instance.
    ///
    /// A missing document (404) is not an error.
    async fn delete_index_item(
        &self,
        instance: &ModelInstance,
        model_name: &str,
    ) -> Result<(), SearchIndexError> {
        let model_index = self.registry.get_model_index(model_name)?;

        let response = self
            .client
            .delete(DeleteParts::IndexId(model_index.index(), &instance.pk))
            .send()
            .await
            .map_err(|e| SearchIndexError::delete(e.to_string()))?;

        let status = response.status_code();

        // 404 is acceptable - document may not exist
        if !status.is_success() && status.as_u16() != 404 {
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %error_body, "Delete request failed");
            return Err(SearchIndexError::delete(format!(
                "Delete failed with status {}: {}",
                status, error_body
            )));
        }

        debug!(model = %model_name, pk = %instance.pk, "Document deleted");
        Ok(())
    }
}
