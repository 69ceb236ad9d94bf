//! Start-up wiring: every collaborator is built once here and injected.

use std::sync::Arc;

use anyhow::Context;
use technav_rag::openai::{OpenAIChatModel, OpenAIEmbeddingProvider};
use technav_rag::pgvector::PgDocumentStore;
use technav_rag::{GenerativeModel, RagConfig, RagService, VectorStoreService};
use tracing::info;

use crate::cli::ConnectionArgs;

/// The two services a command runs against.
pub struct App {
    /// Storage, search and delete operations.
    pub vector_store: Arc<VectorStoreService>,
    /// Question answering and summaries over `vector_store`.
    pub rag: RagService,
}

impl App {
    /// Assemble an app from already-built collaborators.
    pub fn new(vector_store: Arc<VectorStoreService>, model: Arc<dyn GenerativeModel>) -> Self {
        let rag = RagService::new(vector_store.clone(), model);
        Self { vector_store, rag }
    }

    /// Connect to PostgreSQL and the OpenAI-compatible API.
    pub async fn connect(args: &ConnectionArgs) -> anyhow::Result<Self> {
        let database_url = args
            .database_url
            .as_deref()
            .context("DATABASE_URL is not set (or pass --database-url)")?;
        let api_key = args
            .openai_api_key
            .as_deref()
            .context("OPENAI_API_KEY is not set (or pass --openai-api-key)")?;

        let store = PgDocumentStore::new(database_url)
            .await
            .context("connecting to PostgreSQL")?
            .with_table(&args.table)?;
        store
            .ensure_schema(args.embedding_dimensions)
            .await
            .context("preparing the documents table")?;

        let mut embedder = OpenAIEmbeddingProvider::new(api_key)?
            .with_model(&args.embedding_model)
            .with_dimensions(args.embedding_dimensions);
        let mut chat = OpenAIChatModel::new(api_key)?.with_model(&args.chat_model);
        if let Some(base_url) = &args.openai_base_url {
            embedder = embedder.with_base_url(base_url);
            chat = chat.with_base_url(base_url);
        }

        let vector_store = VectorStoreService::builder()
            .config(RagConfig::default())
            .embedding_provider(Arc::new(embedder))
            .document_store(Arc::new(store))
            .build()?;

        info!(
            embedding_model = %args.embedding_model,
            dimensions = args.embedding_dimensions,
            chat_model = %args.chat_model,
            table = %args.table,
            "services ready"
        );
        Ok(Self::new(Arc::new(vector_store), Arc::new(chat)))
    }
}
