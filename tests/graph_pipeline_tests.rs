//! End-to-end tests: note source → graph builders → HTML artifact.
//!
//! Everything runs in-process: notes come from `MockNoteSource` or a
//! wiremock Notion server, embeddings from `MockEmbeddingProvider`.
//! Run with: cargo test --test graph_pipeline_tests

use notes_graph::embeddings::{CachedEmbeddingProvider, MockEmbeddingProvider};
use notes_graph::graph::{CorrelationGraphBuilder, GraphBuilder, RelationGraphBuilder};
use notes_graph::notes::{MockNoteSource, NoteBatch, NotionConfig, NotionSource};
use notes_graph::{
    CorrelationOptions, Error, GraphKind, LayoutOptions, NoteRecord, NotesGraphEngine,
    RelationOptions,
};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DB_ID: &str = "991958eedf8044eca81f1f4dac5334d2";

fn reading_list() -> Vec<NoteRecord> {
    vec![
        NoteRecord::new("a", "Ownership")
            .with_summary("Borrowing and lifetimes")
            .with_children(["b", "c"]),
        NoteRecord::new("b", "Borrowing").with_summary("Shared and mutable references"),
        NoteRecord::new("c", "Lifetimes").with_summary("How long references live"),
        NoteRecord::new("d", "Sourdough")
            .with_summary("Starter, flour, water")
            .with_children(["ghost"]),
    ]
}

fn pinned_embedder() -> MockEmbeddingProvider {
    MockEmbeddingProvider::new(3)
        .with_pinned("OwnershipBorrowing and lifetimes", vec![1.0, 0.2, 0.0])
        .with_pinned("BorrowingShared and mutable references", vec![0.9, 0.3, 0.0])
        .with_pinned("LifetimesHow long references live", vec![0.7, 0.7, 0.0])
        .with_pinned("SourdoughStarter, flour, water", vec![0.0, 0.0, 1.0])
}

fn fast_layout() -> LayoutOptions {
    LayoutOptions::default().with_iterations(40)
}

#[tokio::test]
async fn test_both_graphs_from_one_batch() {
    let batch = NoteBatch::new(reading_list());

    let relations = RelationGraphBuilder::from_batch(batch.clone())
        .build_graph(&RelationOptions)
        .await
        .unwrap();
    assert!(relations.is_directed());
    assert_eq!(relations.edge_count(), 2);
    assert!(relations.contains_edge("Ownership", "Lifetimes"));
    assert!(!relations.contains_node("Sourdough"));

    let correlations = CorrelationGraphBuilder::from_batch(batch, Arc::new(pinned_embedder()))
        .build_graph(&CorrelationOptions::with_cutoff(0.8))
        .await
        .unwrap();
    assert!(!correlations.is_directed());
    assert!(correlations.contains_edge("Borrowing", "Ownership"));
    assert!(!correlations.contains_node("Sourdough"));
    for (a, b, weight) in correlations.edges() {
        assert_ne!(a, b);
        assert!(weight.unwrap() > 0.8);
    }
}

#[tokio::test]
async fn test_engine_draws_both_artifacts() {
    let engine = NotesGraphEngine::new(
        Arc::new(MockNoteSource::with_batch("Reading list", reading_list())),
        Arc::new(pinned_embedder()),
    )
    .with_layout(fast_layout());

    let dir = tempfile::tempdir().unwrap();
    let summaries = engine.draw_all("Reading list", dir.path()).await.unwrap();

    assert_eq!(summaries[0].kind, GraphKind::Relations);
    assert_eq!(summaries[1].kind, GraphKind::Correlations);
    for summary in &summaries {
        let html = std::fs::read_to_string(&summary.path).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Ownership"));
        assert!(summary.nodes > 0);
    }

    let relations = std::fs::read_to_string(&summaries[0].path).unwrap();
    assert!(relations.contains("marker-end"));
    let correlations = std::fs::read_to_string(&summaries[1].path).unwrap();
    assert!(!correlations.contains("marker-end"));
}

#[tokio::test]
async fn test_cached_embeddings_are_reused_across_draws() {
    let embedder = pinned_embedder();
    let cached = CachedEmbeddingProvider::new(
        Arc::new(embedder.clone()),
        &notes_graph::CacheConfig::default(),
    );
    let engine = NotesGraphEngine::new(
        Arc::new(MockNoteSource::with_batch("Reading list", reading_list())),
        Arc::new(cached),
    )
    .with_layout(fast_layout());

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("graph.html");
    let first = engine
        .draw(GraphKind::Correlations, "Reading list", &dest)
        .await
        .unwrap();
    let second = engine
        .draw(GraphKind::Correlations, "Reading list", &dest)
        .await
        .unwrap();

    assert_eq!(first.edges, second.edges);
    assert_eq!(embedder.call_count(), 1);
}

#[tokio::test]
async fn test_failed_draw_keeps_previous_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("graph.html");
    std::fs::write(&dest, "previous").unwrap();

    let engine = NotesGraphEngine::new(
        Arc::new(MockNoteSource::with_batch("Reading list", reading_list())),
        Arc::new(pinned_embedder().dropping_last(1)),
    );
    let err = engine
        .draw(GraphKind::Correlations, "Reading list", &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Embedding(_)));
    assert_eq!(std::fs::read_to_string(&dest).unwrap(), "previous");
}

#[tokio::test]
async fn test_engine_over_notion_api() {
    let server = MockServer::start().await;
    let page = |id: &str, title: &str, summary: &str, children: &[&str]| {
        json!({
            "id": id,
            "properties": {
                "Name": { "type": "title", "title": [{ "plain_text": title }] },
                "AI summary": { "type": "rich_text", "rich_text": [{ "plain_text": summary }] },
                "Children": {
                    "type": "relation",
                    "relation": children.iter().map(|c| json!({ "id": c })).collect::<Vec<_>>()
                }
            }
        })
    };

    Mock::given(method("POST"))
        .and(path(format!("/v1/databases/{}/query", DB_ID)))
        .and(header("Notion-Version", "2022-02-22"))
        .and(header("Authorization", "Bearer fake_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                page("id1", "Title1", "Summary1", &["id2", "id3"]),
                page("id2", "Title2", "Summary2", &[]),
                page("id3", "Title3", "Summary3", &[]),
                page("id4", "Title4", "Summary4", &["id1"]),
                { "id": "broken", "properties": {} }
            ]
        })))
        .mount(&server)
        .await;

    let source = NotionSource::new(NotionConfig {
        token: Some("fake_token".into()),
        base_url: server.uri(),
        ..Default::default()
    })
    .unwrap();
    let engine = NotesGraphEngine::new(Arc::new(source), Arc::new(MockEmbeddingProvider::new(8)))
        .with_layout(fast_layout());

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join(GraphKind::Relations.default_file_name());
    let summary = engine
        .draw(GraphKind::Relations, DB_ID, &dest)
        .await
        .unwrap();

    assert_eq!(summary.notes, 4);
    assert_eq!(summary.nodes, 4);
    assert_eq!(summary.edges, 3);
    let html = std::fs::read_to_string(&dest).unwrap();
    assert!(html.contains("Title4 → Title1"));
}
