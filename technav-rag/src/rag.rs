//! RAG service: grounded answers over retrieved documents.
//!
//! The [`RagService`] composes a [`VectorStoreService`] for retrieval, a
//! [`ContextAssembler`] for bounded excerpts and a [`GenerativeModel`] for
//! the answer itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use technav_rag::{DocumentQuery, OwnerScope, RagService};
//!
//! let rag = RagService::new(vector_store, Arc::new(chat_model));
//! let answer = rag
//!     .query_documents(&OwnerScope::owner("u1"), DocumentQuery::new("What is photosynthesis?"))
//!     .await?;
//! println!("{} ({} sources)", answer.answer, answer.sources.len());
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::context::{
    AssembledContext, ContextAssembler, NO_RELEVANT_DOCUMENTS_ANSWER, conversation_prompt,
    document_question_prompt,
};
use crate::document::{ConversationTurn, SearchResult};
use crate::error::{RagError, Result};
use crate::filter::{MetadataFilter, OwnerScope};
use crate::generation::GenerativeModel;
use crate::service::{SearchOptions, VectorStoreService};

/// Type bucket for documents without `metadata.type`.
pub const UNKNOWN_DOCUMENT_TYPE: &str = "unknown";

/// A question over the caller's documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentQuery {
    /// The natural-language question.
    pub question: String,
    /// Maximum documents used as context. Falls back to the configured default.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Optional metadata narrowing.
    #[serde(default)]
    pub metadata_filter: MetadataFilter,
}

impl DocumentQuery {
    /// Create a query with default limit and no filter.
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: question.into(), limit: None, metadata_filter: MetadataFilter::default() }
    }

    /// Set the document limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the metadata filter.
    pub fn with_filter(mut self, filter: MetadataFilter) -> Self {
        self.metadata_filter = filter;
        self
    }
}

/// A generated answer and the documents it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    /// Model output, or the fixed no-results answer.
    pub answer: String,
    /// Retrieved documents with full, untruncated content.
    pub sources: Vec<SearchResult>,
}

/// One entry of [`DocumentsSummary::recent_uploads`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentUpload {
    /// Document id.
    pub id: String,
    /// Title or file name, if any.
    pub title: Option<String>,
    /// Document type, if any.
    pub doc_type: Option<String>,
    /// Upload time. The same value is used for ordering.
    pub upload_date: Option<DateTime<Utc>>,
}

/// Aggregate view over one owner's documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentsSummary {
    /// Number of documents scanned.
    pub total_documents: usize,
    /// Count per `metadata.type`, missing types counted as [`UNKNOWN_DOCUMENT_TYPE`].
    pub document_types: BTreeMap<String, usize>,
    /// Most recent uploads first; documents without an upload date last.
    pub recent_uploads: Vec<RecentUpload>,
}

/// Turns questions plus retrieved documents into grounded answers.
pub struct RagService {
    vector_store: Arc<VectorStoreService>,
    model: Arc<dyn GenerativeModel>,
    assembler: ContextAssembler,
}

impl RagService {
    /// Create a service that retrieves through `vector_store` and answers with `model`.
    ///
    /// Excerpt length and history window come from the vector store's config.
    pub fn new(vector_store: Arc<VectorStoreService>, model: Arc<dyn GenerativeModel>) -> Self {
        let config = vector_store.config();
        let assembler = ContextAssembler::new(config.context_char_limit, config.history_window);
        Self { vector_store, model, assembler }
    }

    /// The vector store service used for retrieval.
    pub fn vector_store(&self) -> &Arc<VectorStoreService> {
        &self.vector_store
    }

    /// The context assembler used to build prompts.
    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    /// Answer `query` from documents visible under `scope`.
    ///
    /// Finding no document above the threshold is a successful outcome: the
    /// answer is [`NO_RELEVANT_DOCUMENTS_ANSWER`] and `sources` is empty.
    ///
    /// # Errors
    ///
    /// Retrieval errors from [`VectorStoreService::advanced_search`] and
    /// generation errors classified as [`RagError::Configuration`],
    /// [`RagError::Transient`] or [`RagError::Generation`].
    pub async fn query_documents(
        &self,
        scope: &OwnerScope,
        query: DocumentQuery,
    ) -> Result<RagAnswer> {
        let config = self.vector_store.config();
        let options = SearchOptions::default()
            .limit(query.limit.unwrap_or(config.default_limit))
            .filter(query.metadata_filter)
            .threshold(config.similarity_threshold);

        let sources = self.vector_store.advanced_search(scope, &query.question, &options).await?;

        if sources.is_empty() {
            warn!(owner = ?scope.owner_id(), "no relevant documents for question");
            return Ok(RagAnswer { answer: NO_RELEVANT_DOCUMENTS_ANSWER.to_string(), sources });
        }

        let context = self.assembler.assemble(&sources);
        let prompt = document_question_prompt(&context, &query.question);
        let answer = self.generate(&prompt).await?;

        info!(
            owner = ?scope.owner_id(),
            source_count = sources.len(),
            "answered question from documents"
        );
        Ok(RagAnswer { answer, sources })
    }

    /// Answer `question` from documents the caller already retrieved.
    ///
    /// Only the last `history_window` turns of `history` reach the prompt;
    /// older turns are dropped. Returns the raw model text.
    ///
    /// # Errors
    ///
    /// [`RagError::Validation`] for a blank question, otherwise the classified
    /// generation errors.
    pub async fn generate_answer(
        &self,
        question: &str,
        documents: &[SearchResult],
        history: &[ConversationTurn],
    ) -> Result<String> {
        if question.trim().is_empty() {
            return Err(RagError::Validation("question must not be empty".to_string()));
        }

        let context: AssembledContext = self.assembler.assemble(documents);
        let history_text = self.assembler.render_history(history);
        let prompt = conversation_prompt(&history_text, &context, question);

        let answer = self.generate(&prompt).await?;
        info!(
            document_count = documents.len(),
            history_turns = self.assembler.recent_history(history).len(),
            "generated conversational answer"
        );
        Ok(answer)
    }

    /// Summarise the documents visible under `scope`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Retrieval`] if listing fails.
    pub async fn get_documents_summary(&self, scope: &OwnerScope) -> Result<DocumentsSummary> {
        let config = self.vector_store.config();
        let documents =
            self.vector_store.get_all_documents(scope, config.summary_scan_limit).await?;

        let mut document_types = BTreeMap::new();
        for document in &documents {
            let doc_type = document
                .metadata
                .doc_type
                .clone()
                .unwrap_or_else(|| UNKNOWN_DOCUMENT_TYPE.to_string());
            *document_types.entry(doc_type).or_insert(0) += 1;
        }

        let mut recent_uploads: Vec<RecentUpload> = documents
            .iter()
            .map(|document| RecentUpload {
                id: document.id.clone(),
                title: document.metadata.display_name().map(str::to_string),
                doc_type: document.metadata.doc_type.clone(),
                upload_date: document.metadata.upload_date,
            })
            .collect();
        // `None < Some(_)`, so descending order leaves undated uploads last.
        recent_uploads.sort_by(|a, b| b.upload_date.cmp(&a.upload_date));
        recent_uploads.truncate(config.recent_uploads_limit);

        Ok(DocumentsSummary { total_documents: documents.len(), document_types, recent_uploads })
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let model = self.model.name();
        let timeout = self.vector_store.config().generation_timeout;

        match tokio::time::timeout(timeout, self.model.generate(prompt)).await {
            Ok(Ok(answer)) => Ok(answer),
            Ok(Err(e)) => {
                error!(model, error = %e, retryable = e.is_retryable(), "answer generation failed");
                Err(match e {
                    RagError::Configuration(_)
                    | RagError::Transient { .. }
                    | RagError::Generation { .. } => e,
                    other => RagError::Generation {
                        model: model.to_string(),
                        message: other.to_string(),
                    },
                })
            }
            Err(_) => {
                error!(model, ?timeout, "answer generation timed out");
                Err(RagError::Transient {
                    operation: "generate".to_string(),
                    message: format!("{model} did not respond within {timeout:?}"),
                })
            }
        }
    }
}
