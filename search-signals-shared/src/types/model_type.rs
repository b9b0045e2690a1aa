//! Model type identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a model type (the "sender" of a lifecycle signal).
///
/// Two model types are equal when their names are equal. The name is what
/// the search index collaborators receive as the model name.
///
/// # Example
///
/// ```
/// use search_signals_shared::ModelType;
///
/// let article = ModelType::new("Article");
/// assert_eq!(article.name(), "Article");
/// assert_eq!(article, ModelType::from("Article"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModelType(String);

impl ModelType {
    /// Create a model type from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModelType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModelType {
    fn from(name: String) -> Self {
        Self(name)
    }
}
