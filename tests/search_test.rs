mod helpers;

use std::sync::Arc;

use helpers::{insert_chunk, insert_chunk_with, store_with_provider, test_store, TestProvider};
use rlm::search::{search, DocKind, SearchOptions};
use rlm::store::insights::remember;
use rlm::store::navigation::ChunkFilters;
use rlm::store::types::{Category, Importance};

fn opts(limit: usize) -> SearchOptions {
    SearchOptions {
        limit,
        ..Default::default()
    }
}

#[test]
fn matching_chunk_ranks_first_with_normalized_score_one() {
    let (_dir, store) = test_store();

    let target = insert_chunk(&store, "Discussion about API redesign");
    insert_chunk(&store, "Notes from the standup meeting");
    insert_chunk(&store, "Grocery shopping reminders");

    let hits = search(&store, "API redesign", &opts(3)).unwrap();
    assert!(!hits.is_empty());
    assert_eq!(hits[0].id, target);
    assert_eq!(hits[0].kind, DocKind::Chunk);
    assert!((hits[0].score - 1.0).abs() < 1e-9);
}

#[test]
fn empty_or_stopword_query_returns_empty() {
    let (_dir, store) = test_store();
    insert_chunk(&store, "Some indexed content");

    assert!(search(&store, "", &opts(5)).unwrap().is_empty());
    assert!(search(&store, "the of and", &opts(5)).unwrap().is_empty());
}

#[test]
fn insights_are_part_of_the_corpus() {
    let (_dir, store) = test_store();

    insert_chunk(&store, "Chunk about deployment pipeline");
    remember(
        &store,
        "Deployment happens every friday evening",
        Category::Fact,
        Importance::High,
        vec![],
    )
    .unwrap();

    let hits = search(&store, "deployment friday", &opts(5)).unwrap();
    assert!(hits.iter().any(|h| h.kind == DocKind::Insight));
    assert!(hits.iter().any(|h| h.kind == DocKind::Chunk));

    // Opting out removes them
    let options = SearchOptions {
        limit: 5,
        include_insights: false,
        ..Default::default()
    };
    let hits = search(&store, "deployment friday", &options).unwrap();
    assert!(hits.iter().all(|h| h.kind == DocKind::Chunk));
}

#[test]
fn project_and_domain_filters_apply_before_truncation() {
    let (_dir, store) = test_store();

    insert_chunk_with(&store, "perf tuning for api", Some("dev"), None, &[]);
    insert_chunk_with(&store, "perf tuning for seo pages", Some("seo"), None, &[]);

    let options = SearchOptions {
        limit: 5,
        filters: ChunkFilters {
            domain: Some("seo".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let hits = search(&store, "perf tuning", &options).unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].summary.contains("seo"));

    let options = SearchOptions {
        limit: 5,
        filters: ChunkFilters {
            project: Some("otherproj".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(search(&store, "perf tuning", &options).unwrap().is_empty());
}

#[test]
fn inverted_date_range_returns_empty() {
    let (_dir, store) = test_store();
    insert_chunk(&store, "dated content to find");

    let options = SearchOptions {
        limit: 5,
        filters: ChunkFilters {
            date_from: Some("2030-01-01".into()),
            date_to: Some("2020-01-01".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    assert!(search(&store, "dated content", &options).unwrap().is_empty());
}

#[test]
fn entity_filter_narrows_results() {
    let (_dir, store) = test_store();

    insert_chunk(&store, "Fixed the bug in src/auth.rs yesterday");
    insert_chunk(&store, "Fixed the bug in docs wording");

    let options = SearchOptions {
        limit: 5,
        filters: ChunkFilters {
            entity: Some("auth.rs".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let hits = search(&store, "fixed bug", &options).unwrap();
    assert_eq!(hits.len(), 1);
}

#[test]
fn any_filter_drops_insights() {
    let (_dir, store) = test_store();

    remember(
        &store,
        "perf insight about the cache",
        Category::Finding,
        Importance::High,
        vec![],
    )
    .unwrap();
    insert_chunk_with(&store, "perf chunk about the cache", Some("dev"), None, &[]);

    let options = SearchOptions {
        limit: 5,
        filters: ChunkFilters {
            domain: Some("dev".into()),
            ..Default::default()
        },
        ..Default::default()
    };
    let hits = search(&store, "perf cache", &options).unwrap();
    assert!(hits.iter().all(|h| h.kind == DocKind::Chunk));
}

#[test]
fn disabled_provider_means_pure_bm25_ranking() {
    let (_dir, store) = test_store();

    insert_chunk(&store, "performance issues with the query planner");
    insert_chunk(&store, "holiday schedule for the team");

    let hits = search(&store, "performance issues", &opts(5)).unwrap();
    assert_eq!(hits.len(), 1);
    assert!((hits[0].score - 1.0).abs() < 1e-9);
}

#[test]
fn semantic_signal_surfaces_non_literal_matches() {
    let (_dir, store) = store_with_provider(Arc::new(TestProvider));

    // "voiture" and "car" share no tokens, but the test provider maps both
    // to the same embedding direction.
    let target = insert_chunk(&store, "La voiture ne démarre plus depuis hier");
    insert_chunk(&store, "Pasta recipe with fresh basil");

    let hits = search(&store, "car broken", &opts(5)).unwrap();
    assert!(
        hits.iter().any(|h| h.id == target),
        "semantic-only match should surface the voiture chunk"
    );
}

#[test]
fn hybrid_fusion_weights_cosine_at_alpha() {
    let (_dir, store) = store_with_provider(Arc::new(TestProvider));

    // Literal match but no semantic affinity to the query
    let literal = insert_chunk(&store, "engine diagnostics report for the pump");
    // Semantic match (car direction) with no literal token overlap
    let semantic = insert_chunk(&store, "la voiture est au garage");

    let hits = search(&store, "car engine", &opts(5)).unwrap();
    let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert!(ids.contains(&literal.as_str()));
    assert!(ids.contains(&semantic.as_str()));

    // cosine=1 for the semantic hit → alpha * 1.0 dominates a pure-BM25 hit
    let sem_score = hits.iter().find(|h| h.id == semantic).unwrap().score;
    let lit_score = hits.iter().find(|h| h.id == literal).unwrap().score;
    assert!(sem_score >= lit_score - 1e-9);
}
