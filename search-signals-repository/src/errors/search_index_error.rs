//! Search index error types.
//!
//! This module defines the unified error type for index registry lookups and
//! search index operations.

use thiserror::Error;

/// Unified errors from the index registry and search index operations.
///
/// `ModelNotManaged` is the lookup failure for a model that has no index. The
/// signal processor treats it as "skip this model", not as a failure.
#[derive(Debug, Clone, Error)]
pub enum SearchIndexError {
    /// The model is not registered with any search index.
    #[error("Model not managed: {0}")]
    ModelNotManaged(String),

    /// Validation error (e.g., zero batch size, malformed registry spec).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Failed to establish connection to the search index backend.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Bulk indexing operation failed.
    #[error("Bulk index error: {0}")]
    BulkIndexError(String),

    /// Failed to delete a document.
    #[error("Delete error: {0}")]
    DeleteError(String),

    /// Failed to parse response from search index backend.
    #[error("Parse error: {0}")]
    ParseError(String),
}

impl SearchIndexError {
    /// Create a model-not-managed error.
    pub fn model_not_managed(model_name: impl Into<String>) -> Self {
        Self::ModelNotManaged(model_name.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    /// Create a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionError(msg.into())
    }

    /// Create a bulk index error.
    pub fn bulk_index(msg: impl Into<String>) -> Self {
        Self::BulkIndexError(msg.into())
    }

    /// Create a delete error.
    pub fn delete(msg: impl Into<String>) -> Self {
        Self::DeleteError(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    /// Whether this error means the model simply has no index.
    pub fn is_not_managed(&self) -> bool {
        matches!(self, Self::ModelNotManaged(_))
    }
}
