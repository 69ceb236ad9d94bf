//! Failures and empty results leave structured log events behind.

mod common;

use std::sync::Arc;

use technav_rag::{DocumentQuery, InMemoryDocumentStore, NewDocument, OwnerScope, RagService};
use technav_telemetry::{EventCaptureLayer, SharedEventLog};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use common::{RecordingModel, UnreachableEmbedder, service};

#[tokio::test]
async fn embedding_failure_is_logged_with_provider_and_preview() {
    let log = SharedEventLog::new();
    let _guard =
        tracing_subscriber::registry().with(EventCaptureLayer::new(log.clone())).set_default();

    let service = service(Arc::new(UnreachableEmbedder), Arc::new(InMemoryDocumentStore::new(8)));
    let content = "x".repeat(80);
    service.store("u1", NewDocument::new(content)).await.unwrap_err();

    let event = log.find("embedding failed").expect("error event");
    assert_eq!(event.level, "ERROR");
    assert_eq!(event.field_str("operation"), Some("store"));
    let preview = event.field_str("input").unwrap();
    assert_eq!(preview, format!("{}...", "x".repeat(50)));
}

#[tokio::test]
async fn question_without_matches_logs_a_warning() {
    let log = SharedEventLog::new();
    let _guard =
        tracing_subscriber::registry().with(EventCaptureLayer::new(log.clone())).set_default();

    let store = Arc::new(InMemoryDocumentStore::new(64));
    let vector_store = Arc::new(service(Arc::new(common::BagOfWordsEmbedder::new(64)), store));
    let rag = RagService::new(vector_store, Arc::new(RecordingModel::new("unused")));
    rag.query_documents(&OwnerScope::owner("u1"), DocumentQuery::new("anything")).await.unwrap();

    let warnings = log.at_level("warn");
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].message, "no relevant documents for question");
}
