//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use technav_rag::{
    Document, DocumentRow, DocumentStore, EmbeddingProvider, GenerativeModel,
    InMemoryDocumentStore, MetadataFilter, OwnerScope, RagConfig, RagError, Result, SearchResult,
    VectorStoreService,
};

/// Hashes each lowercase word into one of `dimensions` buckets, then L2-normalises.
///
/// Texts sharing words get a positive cosine similarity.
pub struct BagOfWordsEmbedder {
    dimensions: usize,
}

impl BagOfWordsEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf29ce484222325u64, |hash, b| (hash ^ b as u64).wrapping_mul(0x100000001b3))
}

#[async_trait]
impl EmbeddingProvider for BagOfWordsEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; self.dimensions];
        for word in text.to_lowercase().split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty())
        {
            v[(fnv1a(word) % self.dimensions as u64) as usize] += 1.0;
        }
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(v)
    }

    fn name(&self) -> &str {
        "bag-of-words"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Returns a preset vector per exact input text.
pub struct FixedEmbedder {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, vectors: HashMap::new() }
    }

    pub fn with(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.vectors.get(text).cloned().ok_or_else(|| RagError::Embedding {
            provider: "fixed".into(),
            message: format!("no vector registered for '{text}'"),
        })
    }

    fn name(&self) -> &str {
        "fixed"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Counts calls before delegating.
pub struct CountingEmbedder<E> {
    inner: E,
    calls: AtomicUsize,
}

impl<E> CountingEmbedder<E> {
    pub fn new(inner: E) -> Self {
        Self { inner, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: EmbeddingProvider> EmbeddingProvider for CountingEmbedder<E> {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.embed(text).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Always fails as if the provider were unreachable.
pub struct UnreachableEmbedder;

#[async_trait]
impl EmbeddingProvider for UnreachableEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::Embedding { provider: "unreachable".into(), message: "connection refused".into() })
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledEmbedder;

#[async_trait]
impl EmbeddingProvider for StalledEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![0.0; 8])
    }

    fn dimensions(&self) -> usize {
        8
    }
}

/// Records every prompt and replies with a fixed answer.
pub struct RecordingModel {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingModel {
    pub fn new(answer: impl Into<String>) -> Self {
        Self { answer: answer.into(), prompts: Mutex::new(Vec::new()) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for RecordingModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.answer.clone())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Fails every call with an error built by `make_error`.
pub struct FailingModel {
    make_error: Box<dyn Fn() -> RagError + Send + Sync>,
}

impl FailingModel {
    pub fn new(make_error: impl Fn() -> RagError + Send + Sync + 'static) -> Self {
        Self { make_error: Box::new(make_error) }
    }
}

#[async_trait]
impl GenerativeModel for FailingModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err((self.make_error)())
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Never answers within any reasonable timeout.
pub struct StalledModel;

#[async_trait]
impl GenerativeModel for StalledModel {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(String::new())
    }

    fn name(&self) -> &str {
        "stalled"
    }
}

/// Which [`FailingStore`] operation breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreFault {
    Insert,
    /// Insert succeeds but reports one id fewer than rows written.
    ShortInsert,
    Match,
    List,
    FindIds,
    Delete,
}

/// An in-memory store with one operation that always fails.
///
/// Failures carry a non-store error kind so tests can see the service
/// reclassify them.
pub struct FailingStore {
    fault: StoreFault,
    inner: InMemoryDocumentStore,
}

impl FailingStore {
    pub fn new(fault: StoreFault, dimensions: usize) -> Self {
        Self { fault, inner: InMemoryDocumentStore::new(dimensions) }
    }

    pub fn inner(&self) -> &InMemoryDocumentStore {
        &self.inner
    }

    fn check(&self, operation: StoreFault) -> Result<()> {
        if self.fault == operation {
            return Err(RagError::Transient {
                operation: format!("{operation:?}"),
                message: "connection reset".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FailingStore {
    fn backend(&self) -> &str {
        "broken"
    }

    async fn insert(&self, rows: Vec<DocumentRow>) -> Result<Vec<String>> {
        self.check(StoreFault::Insert)?;
        let mut ids = self.inner.insert(rows).await?;
        if self.fault == StoreFault::ShortInsert {
            ids.pop();
        }
        Ok(ids)
    }

    async fn match_documents(
        &self,
        embedding: &[f32],
        match_count: usize,
        scope: &OwnerScope,
        filter: &MetadataFilter,
    ) -> Result<Vec<SearchResult>> {
        self.check(StoreFault::Match)?;
        self.inner.match_documents(embedding, match_count, scope, filter).await
    }

    async fn list(&self, scope: &OwnerScope, limit: usize) -> Result<Vec<Document>> {
        self.check(StoreFault::List)?;
        self.inner.list(scope, limit).await
    }

    async fn find_ids(&self, scope: &OwnerScope, filter: &MetadataFilter) -> Result<Vec<String>> {
        self.check(StoreFault::FindIds)?;
        self.inner.find_ids(scope, filter).await
    }

    async fn delete(&self, ids: &[String]) -> Result<u64> {
        self.check(StoreFault::Delete)?;
        self.inner.delete(ids).await
    }
}

/// A unit vector at `degrees` in the first two components of a `dimensions`-long vector.
pub fn unit_at(degrees: f32, dimensions: usize) -> Vec<f32> {
    let mut v = vec![0.0f32; dimensions];
    let radians = degrees.to_radians();
    v[0] = radians.cos();
    v[1] = radians.sin();
    v
}

/// A service over `store` with the given embedder and default config.
pub fn service(
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn DocumentStore>,
) -> VectorStoreService {
    service_with_config(embedder, store, RagConfig::default())
}

pub fn service_with_config(
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn DocumentStore>,
    config: RagConfig,
) -> VectorStoreService {
    VectorStoreService::builder()
        .config(config)
        .embedding_provider(embedder)
        .document_store(store)
        .build()
        .expect("service should build")
}
