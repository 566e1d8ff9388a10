mod common;

use common::{plant, ram_engine};
use plantdb_search::search::{
    self, ParsedDocument, SearchEngine, SearchError, SearchQueryBuilder, SearchSchemaBuilder,
};
use serde_json::json;
use tempfile::TempDir;

const WRITER_BUDGET: usize = 15_000_000;

async fn index_documents(engine: &SearchEngine, documents: Vec<ParsedDocument>) {
    let writer = engine.batch_writer(WRITER_BUDGET).expect("writer");
    writer.commit_documents(documents).await.expect("commit");
    writer.finish().await.expect("merges");
}

fn rose() -> ParsedDocument {
    ParsedDocument::new(
        "plants/rose.json",
        json!({
            "name": "Rose",
            "lifeCycle": "Perennial",
            "description": "Thorny shrub with fragrant blooms",
        }),
    )
}

#[tokio::test]
async fn keyword_fields_match_verbatim_only() {
    let engine = ram_engine();
    index_documents(&engine, vec![rose()]).await;

    let lower = search::search(&engine, "rose", 52).await.expect("search");
    assert!(lower.is_empty(), "keyword field must be case-sensitive");

    let exact = search::search(&engine, "Rose", 52).await.expect("search");
    assert_eq!(exact.len(), 1);
    assert_eq!(exact[0].id, "plants/rose.json");
}

#[tokio::test]
async fn body_text_is_case_insensitive_and_stemmed() {
    let engine = ram_engine();
    index_documents(&engine, vec![rose()]).await;

    for query in ["FRAGRANT", "fragrant", "bloom", "Thorny"] {
        let hits = search::search(&engine, query, 52).await.expect("search");
        assert_eq!(hits.len(), 1, "query {query:?}");
    }
}

#[tokio::test]
async fn perennial_round_trip() {
    let engine = ram_engine();
    index_documents(
        &engine,
        vec![
            ParsedDocument::new("a", plant("Hosta", "Perennial", "Shade foliage")),
            ParsedDocument::new("b", plant("Marigold", "Annual", "Orange flowers")),
        ],
    )
    .await;

    // lifeCycle is a keyword field: only the verbatim value matches
    let hits = search::search(&engine, "Perennial", 52).await.expect("search");
    let ids: Vec<_> = hits.iter().map(|hit| hit.id.as_str()).collect();
    assert_eq!(ids, vec!["a"]);
    assert_eq!(hits[0].fields["lifeCycle"], "Perennial");
}

#[tokio::test]
async fn free_text_perennial_matches_body() {
    let engine = ram_engine();
    index_documents(
        &engine,
        vec![ParsedDocument::new(
            "fern",
            json!({ "name": "Fern", "notes": "A hardy perennial for damp corners" }),
        )],
    )
    .await;

    let hits = search::search(&engine, "perennial", 52).await.expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "fern");
}

#[tokio::test]
async fn any_term_is_enough_to_match() {
    let engine = ram_engine();
    index_documents(
        &engine,
        vec![
            ParsedDocument::new("a", json!({ "notes": "tall sunflower" })),
            ParsedDocument::new("b", json!({ "notes": "creeping thyme" })),
            ParsedDocument::new("c", json!({ "notes": "sunflower and thyme" })),
        ],
    )
    .await;

    let hits = search::search(&engine, "sunflower thyme", 52).await.expect("search");
    assert_eq!(hits.len(), 3);
    // Matching both terms ranks first
    assert_eq!(hits[0].id, "c");
}

#[tokio::test]
async fn limit_caps_hits_but_not_total() {
    let engine = ram_engine();
    let documents = (0..60)
        .map(|i| ParsedDocument::new(format!("p{i}"), json!({ "notes": "garden herb" })))
        .collect();
    index_documents(&engine, documents).await;

    let hits = search::search(&engine, "herb", 52).await.expect("search");
    assert_eq!(hits.len(), 52);

    let results = SearchQueryBuilder::new("herb")
        .limit(5)
        .execute_with_metadata(&engine)
        .await
        .expect("search");
    assert_eq!(results.hits.len(), 5);
    assert_eq!(results.total_count, 60);
    assert!(results.has_more());
}

#[tokio::test]
async fn empty_query_is_rejected() {
    let engine = ram_engine();
    let err = search::search(&engine, "   ", 52).await.expect_err("empty query");
    assert!(matches!(err, SearchError::EmptyQuery));
}

#[tokio::test]
async fn stop_word_query_returns_no_hits() {
    let engine = ram_engine();
    index_documents(&engine, vec![rose()]).await;
    let hits = search::search(&engine, "the", 52).await.expect("search");
    assert!(hits.is_empty());
}

#[tokio::test]
async fn same_id_is_replaced_not_duplicated() {
    let engine = ram_engine();
    index_documents(&engine, vec![rose()]).await;
    index_documents(
        &engine,
        vec![ParsedDocument::new(
            "plants/rose.json",
            json!({ "name": "Rose", "description": "Climbing variety" }),
        )],
    )
    .await;

    assert_eq!(engine.num_docs(), 1);
    let hits = search::search(&engine, "climbing", 52).await.expect("search");
    assert_eq!(hits.len(), 1);
    assert!(search::search(&engine, "thorny", 52).await.expect("search").is_empty());
}

#[tokio::test]
async fn reopening_keeps_committed_documents() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("plantdb.index");

    {
        let engine = SearchEngine::open_or_create(&path).expect("create");
        assert!(!engine.opened_existing());
        index_documents(&engine, vec![rose()]).await;
    }

    let engine = SearchEngine::open_or_create(&path).expect("reopen");
    assert!(engine.opened_existing());
    assert_eq!(engine.num_docs(), 1);
    let hits = engine.search("Rose", 52).await.expect("search");
    assert_eq!(hits.len(), 1);

    let stats = engine.get_stats().await;
    assert_eq!(stats.num_documents, 1);
    assert!(stats.index_size_bytes.unwrap_or(0) > 0);
    assert!(stats.last_commit.is_some());
}

#[tokio::test]
async fn incompatible_existing_index_is_not_overwritten() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("plantdb.index");

    {
        let engine = SearchEngine::open_or_create_with(
            &path,
            SearchSchemaBuilder::new().with_keyword_fields(["name"]),
        )
        .expect("create");
        index_documents(&engine, vec![rose()]).await;
    }

    let err = match SearchEngine::open_or_create(&path) {
        Ok(_) => panic!("schema without the plant keyword fields must be rejected"),
        Err(err) => err,
    };
    assert!(matches!(err, SearchError::SchemaMismatch { .. }));

    let engine = SearchEngine::open_or_create_with(
        &path,
        SearchSchemaBuilder::new().with_keyword_fields(["name"]),
    )
    .expect("original schema still opens");
    assert_eq!(engine.num_docs(), 1);
}
