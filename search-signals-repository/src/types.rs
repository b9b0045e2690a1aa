//! Model index description and batch operation result types.

use search_signals_shared::{ModelInstance, ModelType};
use serde_json::{Map, Value};

use crate::errors::SearchIndexError;

/// Describes how one model type is stored in the search index.
///
/// `fields` restricts which instance fields are serialized into the search
/// document. `None` indexes every field.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelIndex {
    index: String,
    model: ModelType,
    fields: Option<Vec<String>>,
}

impl ModelIndex {
    /// Create a model index that stores every field of `model` in `index`.
    pub fn new(index: impl Into<String>, model: impl Into<ModelType>) -> Self {
        Self {
            index: index.into(),
            model: model.into(),
            fields: None,
        }
    }

    /// Restrict the indexed fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// The index this model is stored in.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// The model type.
    pub fn model(&self) -> &ModelType {
        &self.model
    }

    /// Build the search document for an instance.
    ///
    /// Fields missing from the instance are skipped rather than written as null.
    pub fn serialize_object(&self, instance: &ModelInstance) -> Value {
        let document: Map<String, Value> = match &self.fields {
            Some(fields) => fields
                .iter()
                .filter_map(|name| {
                    instance
                        .fields
                        .get(name)
                        .map(|value| (name.clone(), value.clone()))
                })
                .collect(),
            None => instance.fields.clone(),
        };
        Value::Object(document)
    }
}

/// Result of a batch operation for a single item.
#[derive(Debug, Clone)]
pub struct BatchOperationResult {
    /// Primary key of the instance.
    pub pk: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error if the operation failed.
    pub error: Option<SearchIndexError>,
}

/// Summary of a batch operation containing aggregate statistics and individual results.
///
/// This allows callers to handle partial failures gracefully.
#[derive(Debug, Clone, Default)]
pub struct BatchOperationSummary {
    /// Total number of items in the batch.
    pub total: usize,
    /// Number of successful operations.
    pub succeeded: usize,
    /// Number of failed operations.
    pub failed: usize,
    /// Individual results for each item.
    pub results: Vec<BatchOperationResult>,
}

impl BatchOperationSummary {
    /// Build a summary from per-item results.
    pub fn from_results(results: Vec<BatchOperationResult>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }

    /// Fold another summary into this one.
    pub fn merge(&mut self, other: BatchOperationSummary) {
        self.total += other.total;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.results.extend(other.results);
    }
}
