//! Model instance types.
//!
//! A model instance is the record carried by a lifecycle signal. It is
//! buffered on save and serialized into a search document on flush.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single record of some model type.
///
/// # Fields
///
/// - `pk`: Primary key, used as the search document id
/// - `fields`: Column values of the record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInstance {
    pub pk: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl ModelInstance {
    /// Create an instance with no fields.
    ///
    /// # Example
    ///
    /// ```
    /// use search_signals_shared::ModelInstance;
    ///
    /// let instance = ModelInstance::new("42").with_field("title", "Hello");
    /// assert_eq!(instance.pk, "42");
    /// assert_eq!(instance.field("title").and_then(|v| v.as_str()), Some("Hello"));
    /// ```
    pub fn new(pk: impl Into<String>) -> Self {
        Self {
            pk: pk.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style setter for a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Look up a field value by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
