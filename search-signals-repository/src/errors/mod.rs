//! Error types for the search signals repository.
//!
//! This module provides a unified error type for registry lookups and search
//! index operations.

mod search_index_error;

pub use search_index_error::SearchIndexError;
