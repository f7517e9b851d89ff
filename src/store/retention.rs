//! Three-zone retention — archive, purge, restore.
//!
//! Active chunks that go unread for 30 days move gzip-compressed into the
//! archive zone; archived chunks untouched for another 180 days are purged,
//! leaving only a metadata tombstone. Protected tags, frequent access, or
//! protected keywords in the content make a chunk immune to both.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{MemoryError, Result};
use crate::search::tokenizer::strip_accents;
use crate::store::chunks::{estimate_tokens, read_chunk_content, strip_frontmatter};
use crate::store::fileutil::{
    atomic_write, gunzip_bounded, gzip_bytes, resolve_in, resolve_rel, sha256_normalized,
    validate_id, with_locked_json, MAX_DECOMPRESSED_SIZE,
};
use crate::store::types::{
    ArchiveEntry, ArchiveIndex, ChunkIndex, ChunkMeta, Entities, PurgeLog, PurgeRecord,
};
use crate::store::ContextStore;

/// Tags that protect a chunk from archiving and purging.
pub const PROTECTED_TAGS: &[&str] = &["critical", "decision", "keep", "important"];

/// Keywords that protect a chunk, matched ASCII-folded and uppercased in
/// the first ~4 KiB of content.
pub const PROTECTED_KEYWORDS: &[&str] = &["DECISION:", "IMPORTANT:", "A RETENIR:"];

const KEYWORD_SCAN_CHARS: usize = 4096;

// ── Immunity ──────────────────────────────────────────────────────────────────

/// Immunity from metadata alone: protected tag or access threshold.
fn immune_by_meta(tags: &[String], access_count: u32, immune_access_count: u32) -> bool {
    if access_count >= immune_access_count {
        return true;
    }
    tags.iter()
        .any(|t| PROTECTED_TAGS.contains(&t.to_lowercase().as_str()))
}

/// Scan the head of the content for protected keywords, accent-folded.
pub(crate) fn has_protected_keyword(content: &str) -> bool {
    let head: String = content.chars().take(KEYWORD_SCAN_CHARS).collect();
    let folded = strip_accents(&head).to_uppercase();
    PROTECTED_KEYWORDS.iter().any(|kw| folded.contains(kw))
}

/// Full immunity predicate for an active chunk. An unreadable content file
/// only disables the keyword check.
fn chunk_is_immune(store: &ContextStore, meta: &ChunkMeta) -> bool {
    let immune_access = store.config().retention.immune_access_count;
    if immune_by_meta(&meta.tags, meta.access_count, immune_access) {
        return true;
    }
    match read_chunk_content(store, meta) {
        Ok(content) => has_protected_keyword(&content),
        Err(_) => false,
    }
}

// ── Candidates ────────────────────────────────────────────────────────────────

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    // Date-only fallback (legacy entries, ID-derived dates)
    let date = NaiveDate::parse_from_str(value.get(..10)?, "%Y-%m-%d").ok()?;
    Some(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    ))
}

fn age_days(timestamp: &str, now: DateTime<Utc>) -> Option<i64> {
    parse_timestamp(timestamp).map(|ts| (now - ts).num_days())
}

/// Active chunks eligible for archiving: older than the threshold, never
/// read, and not immune.
pub fn archive_candidates(store: &ContextStore) -> Result<Vec<ChunkMeta>> {
    let index = store.load_index()?;
    let now = Utc::now();
    let threshold = store.config().retention.archive_after_days;

    Ok(index
        .chunks
        .into_iter()
        .filter(|c| !c.archived)
        .filter(|c| c.access_count == 0)
        .filter(|c| {
            age_days(&c.created_at, now)
                .or_else(|| age_days(&c.id, now))
                .map_or(false, |days| days >= threshold)
        })
        .filter(|c| !chunk_is_immune(store, c))
        .collect())
}

/// Archived chunks eligible for purging: past the purge window and not
/// immune by their metadata snapshot.
pub fn purge_candidates(store: &ContextStore) -> Result<Vec<ArchiveEntry>> {
    let archive = store.load_archive_index()?;
    let now = Utc::now();
    let threshold = store.config().retention.purge_after_days;
    let immune_access = store.config().retention.immune_access_count;

    Ok(archive
        .archives
        .into_iter()
        .filter(|a| age_days(&a.archived_at, now).map_or(false, |days| days >= threshold))
        .filter(|a| !immune_by_meta(&a.tags, a.access_count, immune_access))
        .collect())
}

// ── Preview / run ─────────────────────────────────────────────────────────────

/// One candidate row in the preview output.
#[derive(Debug, Serialize)]
pub struct CandidateInfo {
    pub id: String,
    pub summary: String,
    pub created_at: String,
    pub tags: Vec<String>,
    pub access_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<String>,
}

/// Read-only preview of what a retention pass would do.
#[derive(Debug, Serialize)]
pub struct RetentionPreview {
    pub archive_candidates: Vec<CandidateInfo>,
    pub purge_candidates: Vec<CandidateInfo>,
}

/// Enumerate both candidate sets without side effects.
pub fn preview(store: &ContextStore) -> Result<RetentionPreview> {
    let archive = archive_candidates(store)?
        .into_iter()
        .map(|c| CandidateInfo {
            id: c.id,
            summary: c.summary,
            created_at: c.created_at,
            tags: c.tags,
            access_count: c.access_count,
            archived_at: None,
        })
        .collect();

    let purge = purge_candidates(store)?
        .into_iter()
        .map(|a| CandidateInfo {
            id: a.id,
            summary: a.summary,
            created_at: a.created_at,
            tags: a.tags,
            access_count: a.access_count,
            archived_at: Some(a.archived_at),
        })
        .collect();

    Ok(RetentionPreview {
        archive_candidates: archive,
        purge_candidates: purge,
    })
}

/// Outcome of a retention pass.
#[derive(Debug, Serialize)]
pub struct RetentionReport {
    pub archived: Vec<String>,
    pub purged: Vec<String>,
    pub errors: Vec<String>,
}

/// Execute retention: archive candidates always when `archive` is set;
/// purging requires the explicit `purge` flag. Per-item failures are
/// collected, not fatal.
pub fn run(store: &ContextStore, archive: bool, purge: bool) -> Result<RetentionReport> {
    let mut report = RetentionReport {
        archived: Vec::new(),
        purged: Vec::new(),
        errors: Vec::new(),
    };

    if archive {
        for candidate in archive_candidates(store)? {
            match archive_chunk(store, &candidate.id) {
                Ok(()) => report.archived.push(candidate.id),
                Err(e) => report.errors.push(format!("{}: {e}", candidate.id)),
            }
        }
    }

    if purge {
        for candidate in purge_candidates(store)? {
            match purge_chunk(store, &candidate.id) {
                Ok(()) => report.purged.push(candidate.id),
                Err(e) => report.errors.push(format!("{}: {e}", candidate.id)),
            }
        }
    }

    info!(
        archived = report.archived.len(),
        purged = report.purged.len(),
        errors = report.errors.len(),
        "retention pass complete"
    );
    Ok(report)
}

// ── Zone transitions ──────────────────────────────────────────────────────────

/// Move one chunk from the active zone to the archive: commit the `.gz`
/// first, then flip the index, then drop the original. An interruption
/// before the index update leaves the chunk active with a stray `.gz` that
/// the next pass reconciles.
pub fn archive_chunk(store: &ContextStore, id: &str) -> Result<()> {
    validate_id(id)?;
    let src = resolve_in(&store.chunks_dir(), id, ".md")?;
    if !src.exists() {
        return Err(MemoryError::NotFound(id.to_string()));
    }

    let bytes = std::fs::read(&src)?;
    let dst = resolve_in(&store.archive_dir(), id, ".md.gz")?;
    atomic_write(&dst, &gzip_bytes(&bytes)?)?;

    let snapshot = with_locked_json(&store.index_file(), ChunkIndex::default, |index| {
        match index.find_mut(id) {
            Some(meta) => {
                meta.archived = true;
                Ok(meta.clone())
            }
            None => Err(MemoryError::NotFound(id.to_string())),
        }
    })?;

    with_locked_json(&store.archive_index_file(), ArchiveIndex::default, |archive| {
        archive.archives.retain(|a| a.id != id);
        archive.archives.push(ArchiveEntry {
            id: id.to_string(),
            path: snapshot.path.clone(),
            archive_path: format!("archive/{id}.md.gz"),
            archived_at: Utc::now().to_rfc3339(),
            summary: snapshot.summary.clone(),
            tags: snapshot.tags.clone(),
            created_at: snapshot.created_at.clone(),
            access_count: snapshot.access_count,
            project: snapshot.project.clone(),
            domain: snapshot.domain.clone(),
        });
        Ok(())
    })?;

    std::fs::remove_file(&src)?;
    info!(chunk_id = id, "chunk archived");
    Ok(())
}

/// Move one chunk from the archive back to the active zone.
pub fn restore_chunk(store: &ContextStore, id: &str) -> Result<()> {
    validate_id(id)?;
    let archive_index = store.load_archive_index()?;
    let entry = archive_index
        .find(id)
        .cloned()
        .ok_or_else(|| MemoryError::NotFound(id.to_string()))?;

    let gz_path = resolve_rel(store.root(), &entry.archive_path)?;
    let bytes = gunzip_bounded(&gz_path, MAX_DECOMPRESSED_SIZE)?;
    let text = String::from_utf8(bytes.clone())
        .map_err(|_| MemoryError::Encoding(id.to_string()))?;

    let dst = resolve_in(&store.chunks_dir(), id, ".md")?;
    atomic_write(&dst, &bytes)?;

    with_locked_json(&store.index_file(), ChunkIndex::default, |index| {
        match index.find_mut(id) {
            Some(meta) => meta.archived = false,
            None => {
                // Index entry lost; rebuild it from the archive snapshot.
                let content = strip_frontmatter(&text);
                index.chunks.push(ChunkMeta {
                    id: id.to_string(),
                    path: entry.path.clone(),
                    summary: entry.summary.clone(),
                    tags: entry.tags.clone(),
                    created_at: entry.created_at.clone(),
                    project: entry.project.clone(),
                    domain: entry.domain.clone(),
                    ticket: None,
                    tokens_estimate: estimate_tokens(content),
                    content_hash: sha256_normalized(content),
                    access_count: entry.access_count,
                    last_accessed: None,
                    entities: Entities::default(),
                    archived: false,
                });
                index.recompute_totals();
            }
        }
        Ok(())
    })?;

    with_locked_json(&store.archive_index_file(), ArchiveIndex::default, |archive| {
        archive.archives.retain(|a| a.id != id);
        Ok(())
    })?;

    if let Err(e) = std::fs::remove_file(&gz_path) {
        warn!(chunk_id = id, error = %e, "failed to remove archive file after restore");
    }
    info!(chunk_id = id, "chunk restored to active zone");
    Ok(())
}

/// Permanently delete an archived chunk, keeping only its tombstone.
fn purge_chunk(store: &ContextStore, id: &str) -> Result<()> {
    validate_id(id)?;
    let archive_index = store.load_archive_index()?;
    let entry = archive_index
        .find(id)
        .cloned()
        .ok_or_else(|| MemoryError::NotFound(id.to_string()))?;

    with_locked_json(&store.purge_log_file(), PurgeLog::default, |log| {
        log.purged.push(PurgeRecord {
            id: id.to_string(),
            summary: entry.summary.clone(),
            tags: entry.tags.clone(),
            created_at: entry.created_at.clone(),
            archived_at: entry.archived_at.clone(),
            purged_at: Utc::now().to_rfc3339(),
        });
        Ok(())
    })?;

    with_locked_json(&store.archive_index_file(), ArchiveIndex::default, |archive| {
        archive.archives.retain(|a| a.id != id);
        Ok(())
    })?;

    with_locked_json(&store.index_file(), ChunkIndex::default, |index| {
        index.chunks.retain(|c| c.id != id);
        index.recompute_totals();
        Ok(())
    })?;

    let gz_path = resolve_rel(store.root(), &entry.archive_path)?;
    if let Err(e) = std::fs::remove_file(&gz_path) {
        warn!(chunk_id = id, error = %e, "failed to remove purged archive file");
    }
    info!(chunk_id = id, "chunk purged, metadata logged");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_tags_grant_immunity() {
        assert!(immune_by_meta(&["Decision".into()], 0, 3));
        assert!(immune_by_meta(&["keep".into()], 0, 3));
        assert!(!immune_by_meta(&["misc".into()], 0, 3));
    }

    #[test]
    fn access_count_grants_immunity() {
        assert!(immune_by_meta(&[], 3, 3));
        assert!(immune_by_meta(&[], 7, 3));
        assert!(!immune_by_meta(&[], 2, 3));
    }

    #[test]
    fn keyword_scan_is_accent_folded() {
        assert!(has_protected_keyword("DECISION: go with option B"));
        assert!(has_protected_keyword("note — à retenir: toujours tester"));
        assert!(has_protected_keyword("important: release friday"));
        assert!(!has_protected_keyword("nothing special here"));
    }

    #[test]
    fn keyword_scan_is_bounded() {
        let mut content = "x".repeat(KEYWORD_SCAN_CHARS + 10);
        content.push_str("DECISION: too late to matter");
        assert!(!has_protected_keyword(&content));
    }

    #[test]
    fn timestamp_parsing_handles_rfc3339_and_dates() {
        assert!(parse_timestamp("2026-01-18T10:30:00+00:00").is_some());
        assert!(parse_timestamp("2026-01-18").is_some());
        assert!(parse_timestamp("2026-01-18_rlm_001").is_some());
        assert!(parse_timestamp("garbage").is_none());
    }
}
