//! Owner scoping and metadata filters for reads and deletes.
//!
//! The two concerns are separate types. Every read takes an
//! [`OwnerScope`]; crossing owners requires spelling out
//! [`OwnerScope::Unscoped`]. A [`MetadataFilter`] only narrows further.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::DocumentMetadata;
use crate::error::{RagError, Result};

/// Which owner's documents a read may see.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerScope {
    /// Only documents belonging to this owner id.
    Owner(String),
    /// Documents of every owner. Intended for maintenance and development paths.
    Unscoped,
}

impl OwnerScope {
    /// Scope to a single owner.
    pub fn owner(owner_id: impl Into<String>) -> Self {
        OwnerScope::Owner(owner_id.into())
    }

    /// The owner id, if scoped.
    pub fn owner_id(&self) -> Option<&str> {
        match self {
            OwnerScope::Owner(id) => Some(id),
            OwnerScope::Unscoped => None,
        }
    }

    /// Whether a document owned by `owner_id` is visible under this scope.
    pub fn permits(&self, owner_id: &str) -> bool {
        match self {
            OwnerScope::Owner(id) => id == owner_id,
            OwnerScope::Unscoped => true,
        }
    }

    /// Reject a scope that names an empty owner id.
    pub fn validate(&self) -> Result<()> {
        match self {
            OwnerScope::Owner(id) if id.trim().is_empty() => {
                Err(RagError::Validation("owner id must not be empty".to_string()))
            }
            _ => Ok(()),
        }
    }
}

/// Exact-match filter over the filterable metadata keys.
///
/// Set fields are AND'd together. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataFilter {
    /// Match `metadata.title`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Match `metadata.source`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Match `metadata.type`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Match `metadata.fileName`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

impl MetadataFilter {
    /// A filter that matches every document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require an exact title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Require an exact source.
    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Require an exact document type.
    pub fn doc_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Require an exact file name.
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Returns `true` if no field is set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.source.is_none()
            && self.doc_type.is_none()
            && self.file_name.is_none()
    }

    /// Whether `metadata` satisfies every set field.
    pub fn matches(&self, metadata: &DocumentMetadata) -> bool {
        fn field_matches(expected: &Option<String>, actual: &Option<String>) -> bool {
            match expected {
                Some(expected) => actual.as_deref() == Some(expected.as_str()),
                None => true,
            }
        }

        field_matches(&self.title, &metadata.title)
            && field_matches(&self.source, &metadata.source)
            && field_matches(&self.doc_type, &metadata.doc_type)
            && field_matches(&self.file_name, &metadata.file_name)
    }

    /// JSON object for containment queries (`metadata @> $filter`).
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        let fields = [
            ("title", &self.title),
            ("source", &self.source),
            ("type", &self.doc_type),
            ("fileName", &self.file_name),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                object.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> DocumentMetadata {
        DocumentMetadata::new().with_title("Bio").with_type("pdf").with_source("upload")
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(MetadataFilter::new().is_empty());
        assert!(MetadataFilter::new().matches(&sample()));
        assert!(MetadataFilter::new().matches(&DocumentMetadata::default()));
    }

    #[test]
    fn set_fields_are_anded() {
        assert!(MetadataFilter::new().title("Bio").doc_type("pdf").matches(&sample()));
        assert!(!MetadataFilter::new().title("Bio").doc_type("text").matches(&sample()));
        assert!(!MetadataFilter::new().file_name("bio.pdf").matches(&sample()));
    }

    #[test]
    fn to_json_only_contains_set_fields() {
        let filter = MetadataFilter::new().doc_type("pdf").file_name("a.pdf");
        assert_eq!(filter.to_json(), json!({"type": "pdf", "fileName": "a.pdf"}));
        assert_eq!(MetadataFilter::new().to_json(), json!({}));
    }

    #[test]
    fn owner_scope_permits_only_its_owner() {
        let scope = OwnerScope::owner("u1");
        assert!(scope.permits("u1"));
        assert!(!scope.permits("u2"));
        assert!(OwnerScope::Unscoped.permits("u2"));
    }

    #[test]
    fn blank_owner_is_rejected() {
        assert!(matches!(OwnerScope::owner("  ").validate(), Err(RagError::Validation(_))));
        assert!(OwnerScope::owner("u1").validate().is_ok());
        assert!(OwnerScope::Unscoped.validate().is_ok());
    }
}
