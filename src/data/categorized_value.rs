//! A single labeled, access-controlled datum

use serde::{Deserialize, Serialize};

use super::id::{IdGenerator, Uid, UuidGenerator};
use crate::visibility::VisibilityExpression;

/// One categorized value guarded by a visibility expression.
///
/// The id is assigned once at construction and the visibility expression
/// has no setter. `metadata` is the only mutable field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorizedValue {
    id: Uid,
    category: String,
    value: String,
    #[serde(rename = "type")]
    value_type: String,
    visibility: VisibilityExpression,
    metadata: String,
}

impl CategorizedValue {
    /// Create a value with a fresh random id.
    pub fn new(
        category: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
        visibility: impl Into<VisibilityExpression>,
        metadata: impl Into<String>,
    ) -> Self {
        Self::generated(&UuidGenerator, category, value, value_type, visibility, metadata)
    }

    /// Create a value whose id comes from `generator`.
    pub fn generated(
        generator: &dyn IdGenerator,
        category: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
        visibility: impl Into<VisibilityExpression>,
        metadata: impl Into<String>,
    ) -> Self {
        Self::with_id(generator.generate(), category, value, value_type, visibility, metadata)
    }

    /// Create a value with an explicit id.
    pub fn with_id(
        id: impl Into<Uid>,
        category: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
        visibility: impl Into<VisibilityExpression>,
        metadata: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            value: value.into(),
            value_type: value_type.into(),
            visibility: visibility.into(),
            metadata: metadata.into(),
        }
    }

    pub fn id(&self) -> &Uid {
        &self.id
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn value_type(&self) -> &str {
        &self.value_type
    }

    pub fn visibility(&self) -> &VisibilityExpression {
        &self.visibility
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: impl Into<String>) {
        self.metadata = metadata.into();
    }
}
