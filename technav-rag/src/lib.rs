//! # technav-rag
//!
//! Document-grounded question answering for TechNav.
//!
//! ## Overview
//!
//! Two services sit on top of three injected collaborators:
//!
//! - [`VectorStoreService`] embeds documents on write and ranks, filters and
//!   thresholds them on read.
//! - [`RagService`] assembles bounded context from retrieved documents and asks
//!   a [`GenerativeModel`] for a grounded answer, optionally with conversation
//!   history.
//!
//! Collaborators are traits: [`EmbeddingProvider`], [`DocumentStore`] and
//! [`GenerativeModel`]. Construct them once at start-up and pass them in.
//!
//! ## Backends
//!
//! | Feature | Provides |
//! |---------|----------|
//! | *(always)* | [`InMemoryDocumentStore`] |
//! | `openai` | [`openai::OpenAIEmbeddingProvider`], [`openai::OpenAIChatModel`] |
//! | `pgvector` | [`pgvector::PgDocumentStore`] |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use technav_rag::{
//!     DocumentQuery, InMemoryDocumentStore, NewDocument, OwnerScope, RagConfig, RagService,
//!     VectorStoreService,
//! };
//!
//! let vector_store = Arc::new(
//!     VectorStoreService::builder()
//!         .config(RagConfig::default())
//!         .embedding_provider(Arc::new(embedder))
//!         .document_store(Arc::new(InMemoryDocumentStore::new(384)))
//!         .build()?,
//! );
//! vector_store.store("u1", NewDocument::new("Photosynthesis converts sunlight to energy.")).await?;
//!
//! let rag = RagService::new(vector_store, Arc::new(model));
//! let answer = rag
//!     .query_documents(&OwnerScope::owner("u1"), DocumentQuery::new("How do plants get energy?"))
//!     .await?;
//! ```

pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod filter;
pub mod generation;
pub mod inmemory;
pub mod rag;
pub mod service;
pub mod store;

#[cfg(feature = "openai")]
pub mod openai;
#[cfg(feature = "pgvector")]
pub mod pgvector;

pub use config::{RagConfig, RagConfigBuilder};
pub use context::{AssembledContext, ContextAssembler, ContextExcerpt, NO_RELEVANT_DOCUMENTS_ANSWER};
pub use document::{
    ConversationTurn, Document, DocumentMetadata, DocumentRow, NewDocument, Role, SearchResult,
};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use filter::{MetadataFilter, OwnerScope};
pub use generation::GenerativeModel;
pub use inmemory::InMemoryDocumentStore;
pub use rag::{DocumentQuery, DocumentsSummary, RagAnswer, RagService, RecentUpload};
pub use service::{SearchOptions, VectorStoreService, VectorStoreServiceBuilder};
pub use store::DocumentStore;
