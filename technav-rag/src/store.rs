//! Document store trait: persistence and similarity ranking of embedded documents.

use async_trait::async_trait;

use crate::document::{Document, DocumentRow, SearchResult};
use crate::error::Result;
use crate::filter::{MetadataFilter, OwnerScope};

/// A storage backend for embedded documents with similarity search.
///
/// The store is the only shared mutable state in the system and owns its own
/// concurrency control. Writes are append-only inserts; deletes remove rows
/// by id.
///
/// Implementations report write failures as
/// [`RagError::Persistence`](crate::RagError::Persistence) and read failures as
/// [`RagError::Retrieval`](crate::RagError::Retrieval).
///
/// # Example
///
/// ```rust,ignore
/// use technav_rag::{DocumentStore, InMemoryDocumentStore, MetadataFilter, OwnerScope};
///
/// let store = InMemoryDocumentStore::new(384);
/// let ids = store.insert(rows).await?;
/// let results = store
///     .match_documents(&query_embedding, 10, &OwnerScope::owner("u1"), &MetadataFilter::new())
///     .await?;
/// ```
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Short backend name used in errors and logs.
    fn backend(&self) -> &str;

    /// Insert rows as one batch and return their new ids in input order.
    ///
    /// Either every row becomes visible or none does.
    async fn insert(&self, rows: Vec<DocumentRow>) -> Result<Vec<String>>;

    /// Return up to `match_count` documents visible under `scope` and matching
    /// `filter`, ranked by descending similarity to `embedding`.
    async fn match_documents(
        &self,
        embedding: &[f32],
        match_count: usize,
        scope: &OwnerScope,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>>;

    /// List up to `limit` documents visible under `scope`, newest first.
    async fn list(&self, scope: &OwnerScope, limit: usize) -> Result<Vec<Document>>;

    /// Resolve the ids of every document visible under `scope` matching `filter`.
    async fn find_ids(&self, scope: &OwnerScope, filter: &MetadataFilter) -> Result<Vec<String>>;

    /// Delete documents by id. Unknown ids are ignored. Returns the number removed.
    async fn delete(&self, ids: &[String]) -> Result<u64>;
}
