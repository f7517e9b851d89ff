//! Chunk navigation — regex grep, fuzzy grep, and metadata listing.
//!
//! All three operate over the active zone only; archived chunks come back
//! through `peek`'s auto-restore or an explicit `restore`.

use regex::RegexBuilder;
use serde::Serialize;

use crate::error::{MemoryError, Result};
use crate::search::fuzzy::partial_ratio;
use crate::store::chunks::read_chunk_content;
use crate::store::types::ChunkMeta;
use crate::store::ContextStore;

/// Metadata filters shared by grep, fuzzy grep and search.
#[derive(Debug, Default, Clone)]
pub struct ChunkFilters {
    pub project: Option<String>,
    pub domain: Option<String>,
    /// Inclusive `YYYY-MM-DD` bounds, compared lexicographically.
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Case-insensitive substring match across all entity categories.
    pub entity: Option<String>,
}

impl ChunkFilters {
    pub fn is_empty(&self) -> bool {
        self.project.is_none()
            && self.domain.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.entity.is_none()
    }

    /// Whether a chunk's metadata passes every active filter.
    pub fn matches(&self, meta: &ChunkMeta) -> bool {
        if let Some(project) = &self.project {
            if meta.project.as_deref() != Some(project.as_str()) {
                return false;
            }
        }
        if let Some(domain) = &self.domain {
            if meta.domain.as_deref() != Some(domain.as_str()) {
                return false;
            }
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(date) = meta.date() else {
                return false;
            };
            if let Some(from) = &self.date_from {
                if date < from.as_str() {
                    return false;
                }
            }
            if let Some(to) = &self.date_to {
                if date > to.as_str() {
                    return false;
                }
            }
        }
        if let Some(entity) = &self.entity {
            if !meta.entities.matches(entity) {
                return false;
            }
        }
        true
    }
}

/// A regex grep hit.
#[derive(Debug, Serialize)]
pub struct GrepMatch {
    pub chunk_id: String,
    pub line_number: usize,
    pub text: String,
}

/// A fuzzy grep hit with its 0–100 similarity score.
#[derive(Debug, Serialize)]
pub struct FuzzyMatch {
    pub chunk_id: String,
    pub line_number: usize,
    pub score: u8,
    pub text: String,
}

/// Case-insensitive regex search across active chunks.
///
/// The pattern is compiled once; a compile failure is `InvalidPattern` and
/// leaves no state change. Matches are listed chunk by chunk in index
/// order, then by line position, capped at `limit`.
pub fn grep(
    store: &ContextStore,
    pattern: &str,
    filters: &ChunkFilters,
    limit: usize,
) -> Result<Vec<GrepMatch>> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|e| MemoryError::InvalidPattern(e.to_string()))?;

    let index = store.load_index()?;
    let mut matches = Vec::new();

    'chunks: for meta in index.chunks.iter().filter(|c| !c.archived) {
        if !filters.matches(meta) {
            continue;
        }
        let Ok(content) = read_chunk_content(store, meta) else {
            continue;
        };
        for (i, line) in content.lines().enumerate() {
            if regex.is_match(line) {
                matches.push(GrepMatch {
                    chunk_id: meta.id.clone(),
                    line_number: i + 1,
                    text: line.trim().to_string(),
                });
                if matches.len() >= limit {
                    break 'chunks;
                }
            }
        }
    }

    Ok(matches)
}

/// Typo-tolerant grep: every line of every matching chunk is scored with
/// partial-ratio similarity; hits at or above `threshold` come back sorted
/// by score descending.
pub fn grep_fuzzy(
    store: &ContextStore,
    pattern: &str,
    threshold: u8,
    filters: &ChunkFilters,
    limit: usize,
) -> Result<Vec<FuzzyMatch>> {
    let index = store.load_index()?;
    let mut matches = Vec::new();

    for meta in index.chunks.iter().filter(|c| !c.archived) {
        if !filters.matches(meta) {
            continue;
        }
        let Ok(content) = read_chunk_content(store, meta) else {
            continue;
        };
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let score = partial_ratio(pattern, line);
            if score >= threshold {
                matches.push(FuzzyMatch {
                    chunk_id: meta.id.clone(),
                    line_number: i + 1,
                    score,
                    text: line.chars().take(150).collect(),
                });
            }
        }
    }

    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.truncate(limit);
    Ok(matches)
}

/// One row of `list_chunks` output — metadata only.
#[derive(Debug, Serialize)]
pub struct ChunkListing {
    pub id: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub project: Option<String>,
    pub domain: Option<String>,
    pub tokens_estimate: usize,
    pub created_at: String,
    pub access_count: u32,
    pub last_accessed: Option<String>,
    pub archived: bool,
}

/// Projection of the index ordered by `created_at` descending.
pub fn list_chunks(
    store: &ContextStore,
    project: Option<&str>,
    domain: Option<&str>,
    limit: usize,
) -> Result<Vec<ChunkListing>> {
    let index = store.load_index()?;

    let mut chunks: Vec<&ChunkMeta> = index
        .chunks
        .iter()
        .filter(|c| project.is_none() || c.project.as_deref() == project)
        .filter(|c| domain.is_none() || c.domain.as_deref() == domain)
        .collect();
    chunks.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    Ok(chunks
        .into_iter()
        .take(limit)
        .map(|c| ChunkListing {
            id: c.id.clone(),
            summary: c.summary.clone(),
            tags: c.tags.clone(),
            project: c.project.clone(),
            domain: c.domain.clone(),
            tokens_estimate: c.tokens_estimate,
            created_at: c.created_at.clone(),
            access_count: c.access_count,
            last_accessed: c.last_accessed.clone(),
            archived: c.archived,
        })
        .collect())
}
