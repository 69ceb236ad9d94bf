//! Vector store service: embedding + persistence on write, ranked and
//! filtered retrieval on read.
//!
//! # Example
//!
//! ```rust,ignore
//! use technav_rag::{
//!     InMemoryDocumentStore, NewDocument, OwnerScope, RagConfig, SearchOptions,
//!     VectorStoreService,
//! };
//!
//! let service = VectorStoreService::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .document_store(Arc::new(InMemoryDocumentStore::new(384)))
//!     .build()?;
//!
//! let doc = NewDocument::new("Photosynthesis converts sunlight to energy.");
//! let id = service.store("u1", doc).await?;
//! let results = service
//!     .advanced_search(&OwnerScope::owner("u1"), "sunlight energy", &SearchOptions::default())
//!     .await?;
//! ```

use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::RagConfig;
use crate::context::truncate_chars;
use crate::document::{Document, DocumentRow, NewDocument, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::filter::{MetadataFilter, OwnerScope};
use crate::store::DocumentStore;

/// Characters of an input echoed back in embedding errors.
const ERROR_PREVIEW_CHARS: usize = 50;

/// Options for [`VectorStoreService::advanced_search`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SearchOptions {
    /// Maximum results. Falls back to [`RagConfig::default_limit`].
    pub limit: Option<usize>,
    /// Metadata narrowing on top of owner scoping.
    pub filter: MetadataFilter,
    /// Minimum similarity. Falls back to [`RagConfig::similarity_threshold`].
    pub threshold: Option<f32>,
    /// When `false`, results carry empty metadata.
    pub include_metadata: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: None,
            filter: MetadataFilter::default(),
            threshold: None,
            include_metadata: true,
        }
    }
}

impl SearchOptions {
    /// Set the result limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the metadata filter.
    pub fn filter(mut self, filter: MetadataFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the similarity threshold.
    pub fn threshold(mut self, threshold: f32) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Choose whether metadata is returned.
    pub fn include_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }
}

/// Translates between raw text and the persisted vector representation.
///
/// Stateless apart from its injected collaborators; share one instance
/// behind an `Arc` for the lifetime of the process. Construct one via
/// [`VectorStoreService::builder()`].
pub struct VectorStoreService {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn DocumentStore>,
}

impl VectorStoreService {
    /// Create a new [`VectorStoreServiceBuilder`].
    pub fn builder() -> VectorStoreServiceBuilder {
        VectorStoreServiceBuilder::default()
    }

    /// Return a reference to the service configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the document store.
    pub fn document_store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Embed and persist one document for `owner_id`, returning its new id.
    ///
    /// `uploadDate`, `originalLength` and `userId` are assigned here and
    /// overwrite any caller-supplied values.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] if `owner_id` or the content is blank.
    /// - [`RagError::Embedding`] or [`RagError::Transient`] if embedding fails;
    ///   nothing is written.
    /// - [`RagError::Persistence`] if the insert fails.
    pub async fn store(&self, owner_id: &str, document: NewDocument) -> Result<String> {
        validate_owner(owner_id)?;
        validate_content(&document, 0)?;

        let embedding = self.embed_text("store", &document.content).await?;
        let row = prepare_row(owner_id, document, embedding);

        let ids = self.insert_rows(vec![row]).await?;
        let id = ids.into_iter().next().ok_or_else(|| RagError::Persistence {
            backend: self.store.backend().to_string(),
            message: "insert returned no id".to_string(),
        })?;

        info!(owner = owner_id, document.id = %id, "stored document");
        Ok(id)
    }

    /// Embed and persist several documents as one batch.
    ///
    /// Every document is validated before any embedding call is made. Embeddings
    /// are requested concurrently, then all rows are inserted in a single call.
    /// Ids are returned in input order.
    ///
    /// # Errors
    ///
    /// Same kinds as [`store`](Self::store). Any failure aborts the whole batch.
    pub async fn store_many(
        &self,
        owner_id: &str,
        documents: Vec<NewDocument>,
    ) -> Result<Vec<String>> {
        validate_owner(owner_id)?;
        for (index, document) in documents.iter().enumerate() {
            validate_content(document, index)?;
        }
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let embeddings =
            try_join_all(documents.iter().map(|doc| self.embed_text("store_many", &doc.content)))
                .await?;

        let expected = documents.len();
        let rows: Vec<DocumentRow> = documents
            .into_iter()
            .zip(embeddings)
            .map(|(document, embedding)| prepare_row(owner_id, document, embedding))
            .collect();

        let ids = self.insert_rows(rows).await?;
        if ids.len() != expected {
            return Err(RagError::Persistence {
                backend: self.store.backend().to_string(),
                message: format!("inserted {expected} documents but received {} ids", ids.len()),
            });
        }

        info!(owner = owner_id, document_count = ids.len(), "stored document batch");
        Ok(ids)
    }

    /// Rank documents visible under `scope` by similarity to `query`.
    ///
    /// Requests `limit × over_fetch_factor` candidates from the store, sorts
    /// them by descending similarity (stable, so ties keep store order) and
    /// truncates to `limit`.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] for a blank query, a zero limit or a blank owner.
    /// - [`RagError::Embedding`] or [`RagError::Transient`] if embedding fails.
    /// - [`RagError::Retrieval`] if the store query fails.
    pub async fn search(
        &self,
        scope: &OwnerScope,
        query: &str,
        limit: usize,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        scope.validate()?;
        if query.trim().is_empty() {
            return Err(RagError::Validation("query must not be empty".to_string()));
        }
        if limit == 0 {
            return Err(RagError::Validation("limit must be greater than zero".to_string()));
        }

        let embedding = self.embed_text("search", query).await?;
        let candidates = limit.saturating_mul(self.config.over_fetch_factor);

        let mut results = self
            .store
            .match_documents(&embedding, candidates, scope, filter)
            .await
            .map_err(|e| {
                error!(owner = ?scope.owner_id(), error = %e, "document store search failed");
                into_retrieval(self.store.backend(), e)
            })?;

        results.sort_by(|a, b| {
            b.similarity.partial_cmp(&a.similarity).unwrap_or(std::cmp::Ordering::Equal)
        });
        results.truncate(limit);

        debug!(
            owner = ?scope.owner_id(),
            limit,
            candidates,
            result_count = results.len(),
            "search completed"
        );
        Ok(results)
    }

    /// Search with a minimum similarity threshold.
    ///
    /// Runs [`search`](Self::search) for `limit × over_fetch_factor` results,
    /// drops those below the threshold and caps the rest at `limit`.
    ///
    /// # Errors
    ///
    /// Same kinds as [`search`](Self::search).
    pub async fn advanced_search(
        &self,
        scope: &OwnerScope,
        query: &str,
        options: &SearchOptions,
    ) -> Result<Vec<SearchResult>> {
        let limit = options.limit.unwrap_or(self.config.default_limit);
        if limit == 0 {
            return Err(RagError::Validation("limit must be greater than zero".to_string()));
        }
        let threshold = options.threshold.unwrap_or(self.config.similarity_threshold);

        let fetch = limit.saturating_mul(self.config.over_fetch_factor);
        let candidates = self.search(scope, query, fetch, &options.filter).await?;
        let candidate_count = candidates.len();

        let mut results: Vec<SearchResult> =
            candidates.into_iter().filter(|r| r.similarity >= threshold).take(limit).collect();

        if !options.include_metadata {
            for result in &mut results {
                result.metadata = Default::default();
            }
        }

        info!(
            owner = ?scope.owner_id(),
            limit,
            threshold,
            candidate_count,
            result_count = results.len(),
            "advanced search completed"
        );
        Ok(results)
    }

    /// List up to `limit` documents visible under `scope`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Retrieval`] if the store query fails.
    pub async fn get_all_documents(
        &self,
        scope: &OwnerScope,
        limit: usize,
    ) -> Result<Vec<Document>> {
        scope.validate()?;
        self.store.list(scope, limit).await.map_err(|e| {
            error!(owner = ?scope.owner_id(), error = %e, "listing documents failed");
            into_retrieval(self.store.backend(), e)
        })
    }

    /// Delete every document visible under `scope` that matches `filter`.
    ///
    /// Resolves matching ids first, then deletes exactly those ids. Returns
    /// the number of removed documents.
    ///
    /// # Errors
    ///
    /// - [`RagError::Validation`] for an unscoped delete with an empty filter.
    /// - [`RagError::Retrieval`] if resolving ids fails.
    /// - [`RagError::Persistence`] if the delete fails.
    pub async fn delete_documents(
        &self,
        scope: &OwnerScope,
        filter: &MetadataFilter,
    ) -> Result<u64> {
        scope.validate()?;
        if matches!(scope, OwnerScope::Unscoped) && filter.is_empty() {
            return Err(RagError::Validation(
                "refusing to delete every document: an unscoped delete needs a metadata filter"
                    .to_string(),
            ));
        }

        let ids = self.store.find_ids(scope, filter).await.map_err(|e| {
            error!(owner = ?scope.owner_id(), error = %e, "resolving documents to delete failed");
            into_retrieval(self.store.backend(), e)
        })?;
        if ids.is_empty() {
            debug!(owner = ?scope.owner_id(), "no documents matched delete filter");
            return Ok(0);
        }

        let removed = self.store.delete(&ids).await.map_err(|e| {
            error!(owner = ?scope.owner_id(), error = %e, "deleting documents failed");
            into_persistence(self.store.backend(), e)
        })?;

        info!(owner = ?scope.owner_id(), removed, "deleted documents");
        Ok(removed)
    }

    async fn insert_rows(&self, rows: Vec<DocumentRow>) -> Result<Vec<String>> {
        let count = rows.len();
        self.store.insert(rows).await.map_err(|e| {
            error!(document_count = count, error = %e, "document store insert failed");
            into_persistence(self.store.backend(), e)
        })
    }

    /// Embed `text` under the configured timeout and check its dimensionality.
    async fn embed_text(&self, operation: &str, text: &str) -> Result<Vec<f32>> {
        let provider = self.embedding_provider.name();
        let outcome =
            tokio::time::timeout(self.config.embedding_timeout, self.embedding_provider.embed(text))
                .await;

        let embedding = match outcome {
            Ok(Ok(embedding)) => embedding,
            Ok(Err(e)) => {
                let (preview, _) = truncate_chars(text, ERROR_PREVIEW_CHARS);
                error!(provider, operation, input = %preview, error = %e, "embedding failed");
                return Err(match e {
                    RagError::Embedding { .. } | RagError::Transient { .. } => e,
                    other => RagError::Embedding {
                        provider: provider.to_string(),
                        message: format!("{operation}: embedding '{preview}' failed: {other}"),
                    },
                });
            }
            Err(_) => {
                let timeout = self.config.embedding_timeout;
                error!(provider, operation, ?timeout, "embedding timed out");
                return Err(RagError::Transient {
                    operation: format!("{operation} embedding"),
                    message: format!(
                        "{provider} did not respond within {:?}",
                        self.config.embedding_timeout
                    ),
                });
            }
        };

        let expected = self.embedding_provider.dimensions();
        if embedding.len() != expected {
            let got = embedding.len();
            error!(provider, operation, got, expected, "embedding dimension mismatch");
            return Err(RagError::Embedding {
                provider: provider.to_string(),
                message: format!(
                    "{operation}: expected {expected} dimensions, got {}",
                    embedding.len()
                ),
            });
        }
        Ok(embedding)
    }
}

fn validate_owner(owner_id: &str) -> Result<()> {
    if owner_id.trim().is_empty() {
        return Err(RagError::Validation("owner id is required".to_string()));
    }
    Ok(())
}

fn validate_content(document: &NewDocument, index: usize) -> Result<()> {
    if document.content.trim().is_empty() {
        return Err(RagError::Validation(format!(
            "document {index} has empty content; content must not be blank"
        )));
    }
    Ok(())
}

/// Merge caller metadata with the fields owned by the write path.
fn prepare_row(owner_id: &str, document: NewDocument, embedding: Vec<f32>) -> DocumentRow {
    let mut metadata = document.metadata;
    metadata.upload_date = Some(Utc::now());
    metadata.original_length = Some(document.content.chars().count());
    metadata.user_id = Some(owner_id.to_string());

    DocumentRow { content: document.content, metadata, embedding, owner_id: owner_id.to_string() }
}

fn into_persistence(backend: &str, e: RagError) -> RagError {
    match e {
        RagError::Persistence { .. } => e,
        other => RagError::Persistence { backend: backend.to_string(), message: other.to_string() },
    }
}

fn into_retrieval(backend: &str, e: RagError) -> RagError {
    match e {
        RagError::Retrieval { .. } => e,
        other => RagError::Retrieval { backend: backend.to_string(), message: other.to_string() },
    }
}

/// Builder for constructing a [`VectorStoreService`].
///
/// The embedding provider and document store are required. The config
/// defaults to [`RagConfig::default()`].
#[derive(Default)]
pub struct VectorStoreServiceBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl VectorStoreServiceBuilder {
    /// Set the service configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the document store backend.
    pub fn document_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the [`VectorStoreService`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Configuration`] if a required collaborator is missing
    /// or the config fails [`RagConfig::validate`].
    pub fn build(self) -> Result<VectorStoreService> {
        let embedding_provider = self.embedding_provider.ok_or_else(|| {
            RagError::Configuration("embedding_provider is required".to_string())
        })?;
        let store = self
            .store
            .ok_or_else(|| RagError::Configuration("document_store is required".to_string()))?;

        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(VectorStoreService {
            config,
            embedding_provider,
            store,
        })
    }
}
