//! In-memory document store using cosine similarity.
//!
//! This module provides [`InMemoryDocumentStore`], a zero-dependency store
//! backed by a `Vec` protected by a `tokio::sync::RwLock`. It is suitable
//! for development, testing, and small corpora.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::document::{Document, DocumentRow, SearchResult};
use crate::error::{RagError, Result};
use crate::filter::{MetadataFilter, OwnerScope};
use crate::store::DocumentStore;

const BACKEND: &str = "InMemory";

/// An in-memory document store using cosine similarity for ranking.
///
/// Documents are kept in insertion order, so equal similarities rank in the
/// order the documents were stored. The store is created for one embedding
/// dimensionality and rejects vectors of any other length.
///
/// # Example
///
/// ```rust,ignore
/// use technav_rag::InMemoryDocumentStore;
///
/// let store = InMemoryDocumentStore::new(384);
/// ```
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    dimensions: usize,
    documents: RwLock<Vec<Document>>,
}

impl InMemoryDocumentStore {
    /// Create an empty store for embeddings of `dimensions` components.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, documents: RwLock::new(Vec::new()) }
    }

    /// The embedding dimensionality this store accepts.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Number of stored documents across all owners.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    /// Returns `true` if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    fn backend(&self) -> &str {
        BACKEND
    }

    async fn insert(&self, rows: Vec<DocumentRow>) -> Result<Vec<String>> {
        // Validate the whole batch before touching shared state.
        if let Some(row) = rows.iter().find(|row| row.embedding.len() != self.dimensions) {
            return Err(RagError::Persistence {
                backend: BACKEND.to_string(),
                message: format!(
                    "embedding has {} dimensions, store expects {}",
                    row.embedding.len(),
                    self.dimensions
                ),
            });
        }

        let mut documents = self.documents.write().await;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id = Uuid::new_v4().to_string();
            documents.push(Document {
                id: id.clone(),
                content: row.content,
                metadata: row.metadata,
                embedding: row.embedding,
                owner_id: row.owner_id,
            });
            ids.push(id);
        }

        debug!(count = ids.len(), "inserted documents into memory");
        Ok(ids)
    }

    async fn match_documents(
        &self,
        embedding: &[f32],
        match_count: usize,
        scope: &OwnerScope,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        if embedding.len() != self.dimensions {
            return Err(RagError::Retrieval {
                backend: BACKEND.to_string(),
                message: format!(
                    "query embedding has {} dimensions, store expects {}",
                    embedding.len(),
                    self.dimensions
                ),
            });
        }

        let documents = self.documents.read().await;
        let mut scored: Vec<SearchResult> = documents
            .iter()
            .filter(|doc| scope.permits(&doc.owner_id) && filter.matches(&doc.metadata))
            .map(|doc| SearchResult {
                id: doc.id.clone(),
                content: doc.content.clone(),
                metadata: doc.metadata.clone(),
                similarity: cosine_similarity(&doc.embedding, embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(match_count);
        Ok(scored)
    }

    async fn list(&self, scope: &OwnerScope, limit: usize) -> Result<Vec<Document>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .rev()
            .filter(|doc| scope.permits(&doc.owner_id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_ids(&self, scope: &OwnerScope, filter: &MetadataFilter) -> Result<Vec<String>> {
        let documents = self.documents.read().await;
        Ok(documents
            .iter()
            .filter(|doc| scope.permits(&doc.owner_id) && filter.matches(&doc.metadata))
            .map(|doc| doc.id.clone())
            .collect())
    }

    async fn delete(&self, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut documents = self.documents.write().await;
        let before = documents.len();
        documents.retain(|doc| !ids.contains(&doc.id));
        let removed = (before - documents.len()) as u64;
        debug!(removed, "deleted documents from memory");
        Ok(removed)
    }
}
