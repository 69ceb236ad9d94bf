//! Data types for documents, metadata, search results, and conversation turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Known metadata fields attached to a stored [`Document`].
///
/// Every field is optional. Keys outside the known set survive a round trip
/// through the `extra` bag, which is flattened into the same JSON object.
/// Serialised keys use the camelCase names the web layer writes
/// (`fileName`, `uploadDate`, `type`, ...).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Human readable title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Where the content came from (`upload`, a URL, ...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Document kind, e.g. `pdf` or `text`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub doc_type: Option<String>,
    /// Original file name for uploaded files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Original file size in bytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    /// Short summary produced at upload time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Assigned by the write path; caller values are overwritten.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_date: Option<DateTime<Utc>>,
    /// Assigned by the write path from the owner id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Content length in characters, assigned by the write path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_length: Option<usize>,
    /// Any other keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentMetadata {
    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the source.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the document type.
    pub fn with_type(mut self, doc_type: impl Into<String>) -> Self {
        self.doc_type = Some(doc_type.into());
        self
    }

    /// Set the file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Set the file size in bytes.
    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = Some(file_size);
        self
    }

    /// Set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Add an extra key outside the known set.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The label used when citing this document: title, then file name.
    pub fn display_name(&self) -> Option<&str> {
        self.title.as_deref().or(self.file_name.as_deref())
    }
}

/// Caller input for the write path: content plus caller-supplied metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewDocument {
    /// The text body. Must not be empty or whitespace-only.
    pub content: String,
    /// Caller-supplied metadata. Server-assigned fields are overwritten on store.
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl NewDocument {
    /// Create a new document with empty metadata.
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), metadata: DocumentMetadata::default() }
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: DocumentMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A row ready for insertion: content, finalised metadata, embedding and owner.
///
/// The document store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    /// The text body.
    pub content: String,
    /// Metadata including the server-assigned fields.
    pub metadata: DocumentMetadata,
    /// Embedding of `content`.
    pub embedding: Vec<f32>,
    /// The owning user.
    pub owner_id: String,
}

/// A persisted unit of retrievable knowledge.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Store-assigned identifier.
    pub id: String,
    /// The text body.
    pub content: String,
    /// Metadata including the server-assigned fields.
    pub metadata: DocumentMetadata,
    /// Embedding of `content`. May be empty when a backend does not return vectors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embedding: Vec<f32>,
    /// The owning user.
    pub owner_id: String,
}

/// A retrieved document paired with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    /// Store-assigned identifier of the matched document.
    pub id: String,
    /// Full, untruncated content.
    pub content: String,
    /// Document metadata. Empty when the caller asked to exclude it.
    pub metadata: DocumentMetadata,
    /// Similarity score, higher is closer.
    pub similarity: f32,
}

/// The author of a [`ConversationTurn`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user.
    User,
    /// The assistant.
    Assistant,
}

impl Role {
    /// Lowercase name used when rendering history into a prompt.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One caller-owned message of a chat conversation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationTurn {
    /// Caller-assigned identifier.
    pub id: String,
    /// Message text.
    pub content: String,
    /// Who wrote it.
    pub role: Role,
    /// When it was written.
    pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    /// Create a turn stamped with the current time and a fresh id.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }

    /// Shorthand for a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Shorthand for an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
