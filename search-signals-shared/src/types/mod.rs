//! This module defines the core data structures used across the signal dispatcher.
//! It re-exports `ModelType` and `ModelInstance`.

pub mod model_instance;
pub mod model_type;

pub use model_instance::ModelInstance;
pub use model_type::ModelType;
