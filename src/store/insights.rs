//! Insight memory — short structured memos in `session_memory.json`.
//!
//! Insights are created by `remember`, never mutated, and destroyed by
//! `forget`. `recall` ranks by the fraction of query tokens found in the
//! insight, falling back to raw substring matching when the tokenizer
//! strips the whole query.

use chrono::Utc;
use tracing::info;

use crate::error::{MemoryError, Result};
use crate::search::tokenizer::tokenize;
use crate::store::fileutil::{read_json_or, with_locked_json};
use crate::store::types::{Category, Importance, Insight, InsightLog};
use crate::store::ContextStore;

/// Save an insight. Returns the stored record with its fresh ID.
pub fn remember(
    store: &ContextStore,
    content: &str,
    category: Category,
    importance: Importance,
    tags: Vec<String>,
) -> Result<Insight> {
    let insight = Insight {
        id: uuid::Uuid::now_v7().to_string(),
        content: content.to_string(),
        category,
        importance,
        tags,
        created_at: Utc::now().to_rfc3339(),
    };

    let stored = insight.clone();
    with_locked_json(&store.memory_file(), InsightLog::default, |log| {
        log.insights.push(insight);
        log.last_updated = Some(Utc::now().to_rfc3339());
        Ok(())
    })?;

    info!(id = %stored.id, category = %stored.category, "insight saved");
    Ok(stored)
}

/// Retrieve insights with optional query and category/importance filters.
///
/// With a query: rank by the fraction of query tokens present in the
/// insight content or tags; equal ratios tie-break on `created_at`
/// descending. A query that tokenizes to nothing falls back to raw
/// case-insensitive substring match. Without a query: newest first.
pub fn recall(
    store: &ContextStore,
    query: Option<&str>,
    category: Option<Category>,
    importance: Option<Importance>,
    limit: usize,
) -> Result<Vec<Insight>> {
    let log: InsightLog = read_json_or(&store.memory_file(), InsightLog::default)?;

    let mut insights: Vec<Insight> = log
        .insights
        .into_iter()
        .filter(|i| category.map_or(true, |c| i.category == c))
        .filter(|i| importance.map_or(true, |imp| i.importance == imp))
        .collect();

    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => {
            let query_tokens = tokenize(query, true);
            let mut scored: Vec<(Insight, f64)> = insights
                .into_iter()
                .filter_map(|insight| {
                    let score = if query_tokens.is_empty() {
                        substring_score(&insight, query)
                    } else {
                        token_ratio(&insight, &query_tokens)
                    };
                    (score > 0.0).then_some((insight, score))
                })
                .collect();
            scored.sort_by(|a, b| {
                b.1.partial_cmp(&a.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| b.0.created_at.cmp(&a.0.created_at))
            });
            Ok(scored.into_iter().take(limit).map(|(i, _)| i).collect())
        }
        None => {
            insights.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            insights.truncate(limit);
            Ok(insights)
        }
    }
}

/// Fraction of query tokens present in the insight content or tags.
fn token_ratio(insight: &Insight, query_tokens: &[String]) -> f64 {
    let content = insight.content.to_lowercase();
    let tags: Vec<String> = insight.tags.iter().map(|t| t.to_lowercase()).collect();

    let matching = query_tokens
        .iter()
        .filter(|token| content.contains(token.as_str()) || tags.iter().any(|t| t.contains(token.as_str())))
        .count();

    matching as f64 / query_tokens.len() as f64
}

/// Raw substring fallback for stopword-only queries.
fn substring_score(insight: &Insight, query: &str) -> f64 {
    let needle = query.to_lowercase();
    let hit = insight.content.to_lowercase().contains(&needle)
        || insight
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(&needle));
    if hit {
        1.0
    } else {
        0.0
    }
}

/// Remove an insight by ID. `NotFound` when no such insight exists.
pub fn forget(store: &ContextStore, id: &str) -> Result<usize> {
    let remaining = with_locked_json(&store.memory_file(), InsightLog::default, |log| {
        let before = log.insights.len();
        log.insights.retain(|i| i.id != id);
        if log.insights.len() == before {
            return Err(MemoryError::NotFound(id.to_string()));
        }
        log.last_updated = Some(Utc::now().to_rfc3339());
        Ok(log.insights.len())
    })?;

    info!(id, "insight forgotten");
    Ok(remaining)
}
