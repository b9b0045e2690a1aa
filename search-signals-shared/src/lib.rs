//! # Search Signals Shared
//!
//! This crate defines the data structures shared across the search signal
//! dispatch system: the model type identifier and the model instances that
//! flow from lifecycle signals into the search index.

pub mod types;

pub use types::model_instance::ModelInstance;
pub use types::model_type::ModelType;
