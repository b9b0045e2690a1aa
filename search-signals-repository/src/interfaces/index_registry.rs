//! Index registry trait definition.

use search_signals_shared::ModelType;

use crate::errors::SearchIndexError;
use crate::types::ModelIndex;

/// Knows which model types are managed by the search system and which index
/// each one is stored in.
///
/// Lookups are synchronous: registries are built once at startup and are
/// read-only afterwards.
pub trait IndexRegistry: Send + Sync {
    /// Resolve the index name for a model type.
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The index the model is stored in
    /// * `Err(SearchIndexError::ModelNotManaged)` - If the model has no index
    fn get_index(&self, model: &ModelType) -> Result<String, SearchIndexError>;

    /// Names of all configured indices.
    fn get_indices(&self) -> Vec<String>;

    /// Names of the models stored in `index`. Empty for an unknown index.
    fn get_models(&self, index: &str) -> Vec<String>;

    /// Resolve the model index for a model name.
    fn get_model_index(&self, model_name: &str) -> Result<ModelIndex, SearchIndexError>;

    /// Every managed model type, in index order.
    fn managed_models(&self) -> Result<Vec<ModelType>, SearchIndexError> {
        let mut models = Vec::new();
        for index in self.get_indices() {
            for model_name in self.get_models(&index) {
                models.push(self.get_model_index(&model_name)?.model().clone());
            }
        }
        Ok(models)
    }
}
