//! In-memory index registry.
//!
//! The registry is built once at startup, either from explicit `ModelIndex`
//! entries or from a compact spec string such as
//! `catalog=Article,Comment;people=User`.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use search_signals_shared::ModelType;
use tracing::debug;

use crate::errors::SearchIndexError;
use crate::interfaces::IndexRegistry;
use crate::types::ModelIndex;

/// Read-only registry mapping indices to the models stored in them.
///
/// A model belongs to exactly one index. Indices are reported in name order;
/// models within an index keep their registration order.
#[derive(Debug, Clone, Default)]
pub struct StaticIndexRegistry {
    indices: BTreeMap<String, Vec<String>>,
    models: HashMap<String, ModelIndex>,
}

impl StaticIndexRegistry {
    /// Create an empty registry. Every model is unmanaged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from model index entries.
    pub fn from_model_indices(
        entries: impl IntoIterator<Item = ModelIndex>,
    ) -> Result<Self, SearchIndexError> {
        let mut registry = Self::new();
        for entry in entries {
            registry.register(entry)?;
        }
        Ok(registry)
    }

    /// Register a model index.
    ///
    /// # Returns
    ///
    /// * `Err(SearchIndexError::ValidationError)` - If the model is already registered
    pub fn register(&mut self, entry: ModelIndex) -> Result<(), SearchIndexError> {
        let model_name = entry.model().name().to_string();
        if let Some(existing) = self.models.get(&model_name) {
            return Err(SearchIndexError::validation(format!(
                "Model '{}' is already registered in index '{}'",
                model_name,
                existing.index()
            )));
        }

        debug!(model = %model_name, index = %entry.index(), "Registered model index");
        self.indices
            .entry(entry.index().to_string())
            .or_default()
            .push(model_name.clone());
        self.models.insert(model_name, entry);
        Ok(())
    }

    /// Number of managed models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no model is managed.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FromStr for StaticIndexRegistry {
    type Err = SearchIndexError;

    /// Parse `index=ModelA,ModelB;other=ModelC`.
    ///
    /// Whitespace around names is ignored, as are empty segments.
    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let mut registry = Self::new();

        for segment in spec.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (index, models) = segment.split_once('=').ok_or_else(|| {
                SearchIndexError::validation(format!(
                    "Index segment '{}' must have the form index=Model,Model",
                    segment
                ))
            })?;

            let index = index.trim();
            if index.is_empty() {
                return Err(SearchIndexError::validation(format!(
                    "Index segment '{}' has an empty index name",
                    segment
                )));
            }

            for model in models.split(',').map(str::trim).filter(|m| !m.is_empty()) {
                registry.register(ModelIndex::new(index, model))?;
            }
        }

        Ok(registry)
    }
}

impl IndexRegistry for StaticIndexRegistry {
    fn get_index(&self, model: &ModelType) -> Result<String, SearchIndexError> {
        self.models
            .get(model.name())
            .map(|entry| entry.index().to_string())
            .ok_or_else(|| SearchIndexError::model_not_managed(model.name()))
    }

    fn get_indices(&self) -> Vec<String> {
        self.indices.keys().cloned().collect()
    }

    fn get_models(&self, index: &str) -> Vec<String> {
        self.indices.get(index).cloned().unwrap_or_default()
    }

    fn get_model_index(&self, model_name: &str) -> Result<ModelIndex, SearchIndexError> {
        self.models
            .get(model_name)
            .cloned()
            .ok_or_else(|| SearchIndexError::model_not_managed(model_name))
    }
}
