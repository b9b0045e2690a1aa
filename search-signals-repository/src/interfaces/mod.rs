//! Interface definitions for the signal processor's collaborators.
//!
//! `IndexRegistry` answers which models are managed and where they are
//! indexed; `SearchIndexProvider` performs the index writes. Both are traits
//! so implementations can be injected and mocked in tests.

mod index_registry;
mod search_index_provider;

pub use index_registry::IndexRegistry;
pub use search_index_provider::SearchIndexProvider;
