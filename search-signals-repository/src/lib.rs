//! # Search Signals Repository
//!
//! This crate provides the collaborator interfaces the signal processor talks
//! to: the index registry that knows which models are managed, and the search
//! index provider that receives bulk updates and deletions. It includes an
//! in-memory registry and a concrete provider for OpenSearch.

pub mod errors;
pub mod interfaces;
pub mod opensearch;
pub mod registry;
pub mod types;

pub use errors::SearchIndexError;
pub use interfaces::{IndexRegistry, SearchIndexProvider};
pub use opensearch::OpenSearchProvider;
pub use registry::StaticIndexRegistry;
pub use types::{BatchOperationResult, BatchOperationSummary, ModelIndex};
