#![allow(dead_code)]

use std::sync::Arc;

use rlm::config::RlmConfig;
use rlm::embedding::{DisabledProvider, EmbeddingProvider};
use rlm::store::chunks::{self, ChunkRequest};
use rlm::store::ContextStore;
use tempfile::TempDir;

/// Open a fresh store on a temp directory with semantic search disabled.
pub fn test_store() -> (TempDir, ContextStore) {
    store_with_provider(Arc::new(DisabledProvider))
}

/// Open a fresh store with a specific embedding provider.
pub fn store_with_provider(
    provider: Arc<dyn EmbeddingProvider>,
) -> (TempDir, ContextStore) {
    let dir = TempDir::new().unwrap();
    let config = Arc::new(RlmConfig::default());
    let store = ContextStore::open(dir.path(), provider, config).unwrap();
    (dir, store)
}

/// Create a chunk with an explicit project so tests never depend on
/// project auto-detection.
pub fn insert_chunk(store: &ContextStore, content: &str) -> String {
    insert_chunk_with(store, content, None, None, &[])
}

pub fn insert_chunk_with(
    store: &ContextStore,
    content: &str,
    domain: Option<&str>,
    summary: Option<&str>,
    tags: &[&str],
) -> String {
    let result = chunks::create_chunk(
        store,
        ChunkRequest {
            content: content.to_string(),
            summary: summary.map(String::from),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            project: Some("testproj".to_string()),
            ticket: None,
            domain: domain.map(String::from),
        },
    )
    .unwrap();
    result.chunk_id
}

/// Rewrite `created_at` for a chunk in index.json, backdating it by
/// `days_ago` days.
pub fn backdate_chunk(store: &ContextStore, id: &str, days_ago: i64) {
    let path = store.index_file();
    let mut doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let old = (chrono::Utc::now() - chrono::Duration::days(days_ago)).to_rfc3339();
    for chunk in doc["chunks"].as_array_mut().unwrap() {
        if chunk["id"] == id {
            chunk["created_at"] = serde_json::Value::String(old.clone());
        }
    }
    std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
}

/// Rewrite `archived_at` for an archive entry, backdating it by
/// `days_ago` days.
pub fn backdate_archive(store: &ContextStore, id: &str, days_ago: i64) {
    let path = store.archive_index_file();
    let mut doc: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let old = (chrono::Utc::now() - chrono::Duration::days(days_ago)).to_rfc3339();
    for entry in doc["archives"].as_array_mut().unwrap() {
        if entry["id"] == id {
            entry["archived_at"] = serde_json::Value::String(old.clone());
        }
    }
    std::fs::write(&path, serde_json::to_vec_pretty(&doc).unwrap()).unwrap();
}

/// Deterministic test embedding provider.
///
/// Texts mentioning a car (EN "car", FR "voiture") all map to the same
/// direction; everything else lands on a text-length-dependent axis. Good
/// enough to exercise the semantic fusion path without a real model.
pub struct TestProvider;

impl EmbeddingProvider for TestProvider {
    fn encode(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0f32; 8];
                let lower = text.to_lowercase();
                if lower.contains("car") || lower.contains("voiture") {
                    v[0] = 1.0;
                } else {
                    v[1 + text.len() % 6] = 1.0;
                }
                v
            })
            .collect())
    }

    fn dim(&self) -> usize {
        8
    }

    fn name(&self) -> &'static str {
        "test"
    }
}
