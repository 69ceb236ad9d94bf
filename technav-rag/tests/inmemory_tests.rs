//! Tests for the in-memory document store: ranking order, owner scoping and batch atomicity.

use technav_rag::document::{DocumentMetadata, DocumentRow};
use technav_rag::filter::{MetadataFilter, OwnerScope};
use technav_rag::inmemory::InMemoryDocumentStore;
use technav_rag::store::DocumentStore;
use technav_rag::RagError;
use proptest::prelude::*;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a row owned by one of two users.
fn arb_row(dim: usize) -> impl Strategy<Value = DocumentRow> {
    ("[a-z ]{5,30}", arb_normalized_embedding(dim), prop::bool::ANY).prop_map(
        |(content, embedding, first_owner)| DocumentRow {
            content,
            metadata: DocumentMetadata::default(),
            embedding,
            owner_id: if first_owner { "u1".to_string() } else { "u2".to_string() },
        },
    )
}

fn row(content: &str, owner: &str, embedding: Vec<f32>) -> DocumentRow {
    DocumentRow {
        content: content.to_string(),
        metadata: DocumentMetadata::default(),
        embedding,
        owner_id: owner.to_string(),
    }
}

/// For any set of stored documents, matching returns results ordered by
/// descending cosine similarity, at most `match_count` of them, and only
/// documents of the scoped owner.
mod prop_inmemory_match_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_bounded_and_scoped(
            rows in proptest::collection::vec(arb_row(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            match_count in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let owned_by_u1 = rows.iter().filter(|r| r.owner_id == "u1").count();
            let results = rt.block_on(async {
                let store = InMemoryDocumentStore::new(DIM);
                store.insert(rows).await.unwrap();
                store
                    .match_documents(&query, match_count, &OwnerScope::owner("u1"), &MetadataFilter::new())
                    .await
                    .unwrap()
            });

            prop_assert!(results.len() <= match_count);
            prop_assert_eq!(results.len(), owned_by_u1.min(match_count));

            for window in results.windows(2) {
                prop_assert!(
                    window[0].similarity >= window[1].similarity,
                    "results not in descending order: {} < {}",
                    window[0].similarity,
                    window[1].similarity,
                );
            }
        }
    }
}

#[tokio::test]
async fn batch_with_wrong_dimension_inserts_nothing() {
    let store = InMemoryDocumentStore::new(2);
    let err = store
        .insert(vec![row("good", "u1", vec![1.0, 0.0]), row("bad", "u1", vec![1.0, 0.0, 0.0])])
        .await
        .unwrap_err();

    assert!(matches!(err, RagError::Persistence { .. }));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn query_with_wrong_dimension_is_a_retrieval_error() {
    let store = InMemoryDocumentStore::new(2);
    store.insert(vec![row("doc", "u1", vec![1.0, 0.0])]).await.unwrap();

    let err = store
        .match_documents(&[1.0, 0.0, 0.0], 5, &OwnerScope::owner("u1"), &MetadataFilter::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RagError::Retrieval { .. }));
}

#[tokio::test]
async fn equal_similarities_keep_insertion_order() {
    let store = InMemoryDocumentStore::new(2);
    let ids = store
        .insert(vec![
            row("first", "u1", vec![1.0, 0.0]),
            row("second", "u1", vec![2.0, 0.0]),
            row("third", "u1", vec![3.0, 0.0]),
        ])
        .await
        .unwrap();

    let results = store
        .match_documents(&[1.0, 0.0], 3, &OwnerScope::owner("u1"), &MetadataFilter::new())
        .await
        .unwrap();
    let returned: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(returned, ids.iter().map(String::as_str).collect::<Vec<_>>());
}

#[tokio::test]
async fn list_is_newest_first_and_scoped() {
    let store = InMemoryDocumentStore::new(2);
    store
        .insert(vec![
            row("old", "u1", vec![1.0, 0.0]),
            row("other", "u2", vec![1.0, 0.0]),
            row("new", "u1", vec![1.0, 0.0]),
        ])
        .await
        .unwrap();

    let listed = store.list(&OwnerScope::owner("u1"), 10).await.unwrap();
    let contents: Vec<&str> = listed.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(contents, vec!["new", "old"]);

    let everything = store.list(&OwnerScope::Unscoped, 2).await.unwrap();
    assert_eq!(everything.len(), 2);
}

#[tokio::test]
async fn delete_ignores_unknown_ids() {
    let store = InMemoryDocumentStore::new(2);
    let ids = store.insert(vec![row("doc", "u1", vec![1.0, 0.0])]).await.unwrap();

    let removed =
        store.delete(&[ids[0].clone(), "missing".to_string()]).await.unwrap();
    assert_eq!(removed, 1);
    assert!(store.is_empty().await);
}
