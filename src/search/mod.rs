//! Hybrid search over chunks and insights.
//!
//! One BM25 corpus covers every active chunk (metadata-prefixed content)
//! and every insight. When an embedding provider is active and the vector
//! store is non-empty, cosine similarity is fused in as
//! `α · cosine + (1 − α) · bm25_norm`; otherwise ranking is pure BM25.
//! Metadata filters are applied before truncation so a filtered query can
//! still fill its limit.

pub mod bm25;
pub mod fuzzy;
pub mod tokenizer;

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::embedding;
use crate::error::Result;
use crate::search::bm25::{normalize_scores, Bm25Index};
use crate::search::tokenizer::tokenize;
use crate::store::chunks::read_chunk_content;
use crate::store::fileutil::read_json_or;
use crate::store::navigation::ChunkFilters;
use crate::store::types::InsightLog;
use crate::store::vecstore::VectorStore;
use crate::store::ContextStore;

const INSIGHT_PREFIX: &str = "insight:";

/// Kind of document behind a search hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    Chunk,
    Insight,
}

/// One ranked search result.
#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DocKind,
    pub score: f64,
    pub summary: String,
}

/// Search parameters beyond the query itself.
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub limit: usize,
    pub filters: ChunkFilters,
    pub include_insights: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 10,
            filters: ChunkFilters::default(),
            include_insights: true,
        }
    }
}

/// Run a hybrid search. An empty or stopword-only query returns an empty
/// list.
pub fn search(store: &ContextStore, query: &str, opts: &SearchOptions) -> Result<Vec<SearchHit>> {
    let query_tokens = tokenize(query, true);
    if query_tokens.is_empty() {
        return Ok(Vec::new());
    }

    let limit = opts.limit.max(1);
    let pool = limit * 3;
    let config = store.config();

    // 1. Unified BM25 corpus: active chunks + insights
    let index = store.load_index()?;
    let mut corpus = Bm25Index::new(config.search.bm25_k1, config.search.bm25_b);
    let mut summaries: HashMap<String, String> = HashMap::new();

    for meta in index.chunks.iter().filter(|c| !c.archived) {
        let content = match read_chunk_content(store, meta) {
            Ok(content) => content,
            Err(e) => {
                debug!(chunk_id = %meta.id, error = %e, "skipping unreadable chunk");
                continue;
            }
        };
        let mut doc = String::new();
        doc.push_str(&meta.summary);
        doc.push(' ');
        doc.push_str(&meta.tags.join(" "));
        doc.push(' ');
        if let Some(project) = &meta.project {
            doc.push_str(project);
            doc.push(' ');
        }
        if let Some(domain) = &meta.domain {
            doc.push_str(domain);
            doc.push(' ');
        }
        doc.push_str(&content);

        corpus.push(meta.id.clone(), &tokenize(&doc, true));
        summaries.insert(meta.id.clone(), meta.summary.clone());
    }

    if opts.include_insights {
        let memory: InsightLog = read_json_or(&store.memory_file(), InsightLog::default)?;
        for insight in &memory.insights {
            let mut doc = insight.content.clone();
            if !insight.tags.is_empty() {
                doc.push(' ');
                doc.push_str(&insight.tags.join(" "));
            }
            let key = format!("{INSIGHT_PREFIX}{}", insight.id);
            corpus.push(key.clone(), &tokenize(&doc, true));
            summaries.insert(key, preview(&insight.content, 80));
        }
    }

    // 2.–3. Raw BM25, min-max normalized over the candidate pool
    let raw: Vec<(String, f64)> = corpus
        .score(&query_tokens)
        .into_iter()
        .take(pool)
        .collect();
    let bm25_map = normalize_scores(&raw);

    // 4. Cosine signal, when a provider is active and vectors exist
    let sem_map = semantic_scores(store, query, pool);

    // 5. Fusion. With no semantic signal, ranking is exactly BM25.
    let alpha = config.search.hybrid_alpha;
    let semantic_active = !sem_map.is_empty();
    let keys: BTreeSet<&String> = bm25_map.keys().chain(sem_map.keys()).collect();

    let mut fused: Vec<(String, f64)> = keys
        .into_iter()
        .map(|key| {
            let bm25 = bm25_map.get(key).copied().unwrap_or(0.0);
            let score = if semantic_active {
                let cosine = sem_map.get(key).copied().unwrap_or(0.0);
                alpha * cosine + (1.0 - alpha) * bm25
            } else {
                bm25
            };
            (key.clone(), score)
        })
        .collect();

    // 6. Filters, applied before truncation
    fused.retain(|(key, _)| {
        if let Some(_insight_id) = key.strip_prefix(INSIGHT_PREFIX) {
            // Insights carry no chunk metadata; any active filter drops them
            return opts.filters.is_empty();
        }
        match index.find(key) {
            Some(meta) => !meta.archived && opts.filters.matches(meta),
            None => false,
        }
    });

    // 7. Rank and truncate
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    fused.truncate(limit);

    Ok(fused
        .into_iter()
        .map(|(key, score)| {
            let kind = if key.starts_with(INSIGHT_PREFIX) {
                DocKind::Insight
            } else {
                DocKind::Chunk
            };
            let summary = summaries
                .get(&key)
                .cloned()
                .or_else(|| index.find(&key).map(|m| m.summary.clone()))
                .unwrap_or_default();
            SearchHit {
                id: key,
                kind,
                score,
                summary,
            }
        })
        .collect())
}

/// Cosine scores for the query against the vector store, or empty when the
/// semantic path is unavailable. Failures degrade silently to BM25-only —
/// a normal mode, not error recovery.
fn semantic_scores(store: &ContextStore, query: &str, pool: usize) -> HashMap<String, f64> {
    let provider = store.provider();
    if !embedding::is_enabled(provider.as_ref()) {
        return HashMap::new();
    }

    let query_vec = match provider.encode(&[query]) {
        Ok(mut rows) if !rows.is_empty() && !rows[0].is_empty() => rows.remove(0),
        Ok(_) => return HashMap::new(),
        Err(e) => {
            warn!(error = %e, "query embedding failed, degrading to BM25-only");
            return HashMap::new();
        }
    };

    let vectors = VectorStore::open(&store.embeddings_file(), provider.name(), provider.dim());
    if vectors.is_empty() {
        return HashMap::new();
    }

    vectors
        .cosine_all(&query_vec)
        .into_iter()
        .take(pool)
        .collect()
}

fn preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}
