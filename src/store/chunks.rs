//! Chunk write and read paths — creation with dedup, auto-summary and
//! entity extraction; peek with archive auto-restore and access tracking.
//!
//! [`create_chunk`] is the single write entry point. The dedup check,
//! sequence allocation and index append all happen while holding the
//! `index.json` lock, so two processes racing on the same day/project can
//! never mint the same ID.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::embedding;
use crate::error::{MemoryError, Result};
use crate::store::fileutil::{
    atomic_write, resolve_in, resolve_rel, sha256_normalized, validate_id, with_locked_json,
    MAX_CHUNK_CONTENT_SIZE,
};
use crate::store::types::{ChunkIndex, ChunkMeta, Entities};
use crate::store::vecstore::VectorStore;
use crate::store::{retention, sessions, ContextStore};

/// Inputs for chunk creation.
#[derive(Debug, Default)]
pub struct ChunkRequest {
    pub content: String,
    pub summary: Option<String>,
    pub tags: Vec<String>,
    pub project: Option<String>,
    pub ticket: Option<String>,
    pub domain: Option<String>,
}

/// Result returned from chunk creation.
#[derive(Debug, Serialize)]
pub struct ChunkResult {
    pub chunk_id: String,
    /// `true` if identical content already existed; no new file was written.
    pub duplicate: bool,
    pub summary: String,
    pub tokens_estimate: usize,
}

/// Full write path: size gate → dedup → ID allocation → file write →
/// index append → session registration → best-effort embedding.
pub fn create_chunk(store: &ContextStore, req: ChunkRequest) -> Result<ChunkResult> {
    // 1. Size gate
    if req.content.len() > MAX_CHUNK_CONTENT_SIZE {
        return Err(MemoryError::InvalidSize {
            actual: req.content.len(),
            limit: MAX_CHUNK_CONTENT_SIZE,
        });
    }

    let content_hash = sha256_normalized(&req.content);
    let summary = match req.summary.as_deref() {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => auto_summarize(&req.content, 80),
    };
    let project = req
        .project
        .clone()
        .map(|p| sanitize_component(&p))
        .unwrap_or_else(detect_project);
    let entities = extract_entities(&req.content);
    let tokens_estimate = estimate_tokens(&req.content);
    let now = Utc::now();
    let created_at = now.to_rfc3339();
    let date = now.format("%Y-%m-%d").to_string();

    let chunks_dir = store.chunks_dir();

    // 2.–5. Everything that reads or mutates index.json happens under its
    // lock: dedup scan, sequence allocation, chunk file write, index append.
    let outcome = with_locked_json(&store.index_file(), ChunkIndex::default, |index| {
        // 2. Dedup gate
        if let Some(existing) = index
            .chunks
            .iter()
            .find(|c| c.content_hash == content_hash)
        {
            return Ok(ChunkResult {
                chunk_id: existing.id.clone(),
                duplicate: true,
                summary: existing.summary.clone(),
                tokens_estimate: existing.tokens_estimate,
            });
        }

        // 3. Allocate the next sequence for this date + project
        let sequence = next_sequence(index, &date, &project);
        let mut id = format!("{date}_{project}_{sequence:03}");
        if let Some(ticket) = req.ticket.as_deref().filter(|t| !t.is_empty()) {
            id.push('_');
            id.push_str(ticket);
        }
        if let Some(domain) = req.domain.as_deref().filter(|d| !d.is_empty()) {
            id.push('_');
            id.push_str(domain);
        }
        validate_id(&id)?;

        // 4. Durably write the chunk file before the index references it
        let chunk_file = resolve_in(&chunks_dir, &id, ".md")?;
        let header = render_frontmatter(
            &summary,
            &req.tags,
            &created_at,
            &project,
            req.domain.as_deref(),
            req.ticket.as_deref(),
            &entities,
        );
        atomic_write(&chunk_file, format!("{header}{}", req.content).as_bytes())?;

        // 5. Append to the index
        index.chunks.push(ChunkMeta {
            id: id.clone(),
            path: format!("chunks/{id}.md"),
            summary: summary.clone(),
            tags: req.tags.clone(),
            created_at: created_at.clone(),
            project: Some(project.clone()),
            domain: req.domain.clone().filter(|d| !d.is_empty()),
            ticket: req.ticket.clone().filter(|t| !t.is_empty()),
            tokens_estimate,
            content_hash: content_hash.clone(),
            access_count: 0,
            last_accessed: None,
            entities: entities.clone(),
            archived: false,
        });
        index.recompute_totals();

        Ok(ChunkResult {
            chunk_id: id,
            duplicate: false,
            summary: summary.clone(),
            tokens_estimate,
        })
    })?;

    if outcome.duplicate {
        debug!(chunk_id = %outcome.chunk_id, "duplicate content, returning existing chunk");
        return Ok(outcome);
    }

    info!(chunk_id = %outcome.chunk_id, tokens = tokens_estimate, "chunk created");

    // 6. Register the session for this date + project
    if let Err(e) = sessions::register_chunk(
        store,
        &outcome.chunk_id,
        &date,
        &project,
        req.domain.as_deref(),
    ) {
        warn!(error = %e, "session registration failed");
    }

    // 7. Best-effort embedding: metadata-prefixed text so tags and project
    // contribute to semantic similarity. Failures never block creation.
    embed_chunk(store, &outcome.chunk_id, &summary, &req.tags, &project, req.domain.as_deref(), &req.content);

    Ok(outcome)
}

fn embed_chunk(
    store: &ContextStore,
    chunk_id: &str,
    summary: &str,
    tags: &[String],
    project: &str,
    domain: Option<&str>,
    content: &str,
) {
    let provider = store.provider();
    if !embedding::is_enabled(provider.as_ref()) {
        return;
    }

    let mut text = String::new();
    if !summary.is_empty() {
        text.push_str(summary);
        text.push('\n');
    }
    if !tags.is_empty() {
        text.push_str(&tags.join(", "));
        text.push('\n');
    }
    text.push_str(project);
    if let Some(domain) = domain {
        text.push(' ');
        text.push_str(domain);
    }
    text.push('\n');
    text.push_str(content);

    match provider.encode(&[text.as_str()]) {
        Ok(mut rows) if !rows.is_empty() => {
            let mut vecs = VectorStore::open(
                &store.embeddings_file(),
                provider.name(),
                provider.dim(),
            );
            if let Err(e) = vecs.add(chunk_id, rows.remove(0)) {
                warn!(chunk_id, error = %e, "failed to persist embedding");
            }
        }
        Ok(_) => {}
        Err(e) => warn!(chunk_id, error = %e, "embedding failed, chunk stored without vector"),
    }
}

// ── Peek ──────────────────────────────────────────────────────────────────────

/// Result of reading (a slice of) a chunk.
#[derive(Debug, Serialize)]
pub struct PeekResult {
    pub chunk_id: String,
    pub content: String,
    pub total_lines: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub access_count: u32,
    /// `true` when the chunk was transparently restored from the archive.
    pub restored: bool,
}

/// Read a chunk, slicing by 1-based inclusive line range.
///
/// If the chunk is archived it is restored to the active zone first — a
/// normal code path, not error recovery. Every successful peek increments
/// `access_count` under the index lock.
pub fn peek(
    store: &ContextStore,
    id: &str,
    start_line: Option<usize>,
    end_line: Option<usize>,
) -> Result<PeekResult> {
    validate_id(id)?;

    let index = store.load_index()?;
    let mut restored = false;

    let path = match index.find(id) {
        Some(meta) => {
            let file = resolve_rel(store.root(), &meta.path)?;
            if !file.exists() {
                restore_if_archived(store, id)?;
                restored = true;
            }
            file
        }
        None => {
            // Not in the index at all — only the archive can save us now.
            restore_if_archived(store, id)?;
            restored = true;
            resolve_in(&store.chunks_dir(), id, ".md")?
        }
    };

    let bytes = std::fs::read(&path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MemoryError::NotFound(id.to_string())
        } else {
            MemoryError::Io(e)
        }
    })?;
    let text =
        String::from_utf8(bytes).map_err(|_| MemoryError::Encoding(id.to_string()))?;
    let content = strip_frontmatter(&text);
    let lines: Vec<&str> = content.lines().collect();
    let total_lines = lines.len();

    // 1-based inclusive range; an out-of-range slice is empty, not an error
    let start = start_line.unwrap_or(1).max(1);
    let end = end_line.unwrap_or(total_lines).min(total_lines);
    let slice = if start > total_lines || end < start {
        String::new()
    } else {
        lines[start - 1..end].join("\n")
    };

    let access_count = increment_access(store, id)?;

    Ok(PeekResult {
        chunk_id: id.to_string(),
        content: slice,
        total_lines,
        start_line: start,
        end_line: end,
        access_count,
        restored,
    })
}

/// Restore `id` from the archive, or fail with `NotFound` when it lives in
/// neither zone.
fn restore_if_archived(store: &ContextStore, id: &str) -> Result<()> {
    let archive = store.load_archive_index()?;
    if archive.find(id).is_none() {
        return Err(MemoryError::NotFound(id.to_string()));
    }
    retention::restore_chunk(store, id)?;
    info!(chunk_id = id, "auto-restored from archive on peek");
    Ok(())
}

/// Bump `access_count` / `last_accessed` under the index lock.
fn increment_access(store: &ContextStore, id: &str) -> Result<u32> {
    with_locked_json(&store.index_file(), ChunkIndex::default, |index| {
        match index.find_mut(id) {
            Some(meta) => {
                meta.access_count += 1;
                meta.last_accessed = Some(Utc::now().to_rfc3339());
                Ok(meta.access_count)
            }
            // Legacy file without an index entry; nothing to track.
            None => Ok(0),
        }
    })
}

// ── Content helpers ───────────────────────────────────────────────────────────

/// Read a chunk file and return its content without the frontmatter.
pub(crate) fn read_chunk_content(store: &ContextStore, meta: &ChunkMeta) -> Result<String> {
    let path = resolve_rel(store.root(), &meta.path)?;
    let bytes = std::fs::read(&path)?;
    let text =
        String::from_utf8(bytes).map_err(|_| MemoryError::Encoding(meta.id.clone()))?;
    Ok(strip_frontmatter(&text).to_string())
}

/// Strip the leading `---` frontmatter block plus the single blank
/// separator line, returning the raw content byte-identically.
pub(crate) fn strip_frontmatter(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("---\n") else {
        return text;
    };
    let Some(end) = rest.find("\n---\n") else {
        return text;
    };
    let body = &rest[end + 5..];
    body.strip_prefix('\n').unwrap_or(body)
}

/// Rough token estimation (1 token ≈ 4 chars for French/English).
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

/// First non-empty, non-heading line, truncated to `max_length` chars.
fn auto_summarize(content: &str, max_length: usize) -> String {
    let first_line = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("Empty content");
    let cleaned = first_line.trim_start_matches('#').trim();
    let cleaned = if cleaned.is_empty() { "Empty content" } else { cleaned };

    if cleaned.chars().count() > max_length {
        let truncated: String = cleaned.chars().take(max_length.saturating_sub(3)).collect();
        format!("{truncated}...")
    } else {
        cleaned.to_string()
    }
}

fn render_frontmatter(
    summary: &str,
    tags: &[String],
    created_at: &str,
    project: &str,
    domain: Option<&str>,
    ticket: Option<&str>,
    entities: &Entities,
) -> String {
    let mut header = String::from("---\n");
    header.push_str(&format!("summary: {summary}\n"));
    header.push_str(&format!("tags: {}\n", tags.join(", ")));
    header.push_str(&format!("created_at: {created_at}\n"));
    header.push_str(&format!("project: {project}\n"));
    header.push_str(&format!("domain: {}\n", domain.unwrap_or("")));
    header.push_str(&format!("ticket: {}\n", ticket.unwrap_or("")));
    header.push_str("entities:\n");
    if entities.is_empty() {
        header.push_str("  (none)\n");
    } else {
        for (etype, values) in entities.iter() {
            if !values.is_empty() {
                header.push_str(&format!("  {etype}: {}\n", values.join(", ")));
            }
        }
    }
    header.push_str("---\n\n");
    header
}

// ── Project detection ─────────────────────────────────────────────────────────

/// Project name for new chunks: `RLM_PROJECT` env override, else the
/// nearest ancestor git repository's directory name, else the CWD name.
fn detect_project() -> String {
    if let Ok(project) = std::env::var("RLM_PROJECT") {
        if !project.is_empty() {
            return sanitize_component(&project);
        }
    }

    let cwd = std::env::current_dir().unwrap_or_default();
    if let Some(root) = find_git_root(&cwd) {
        if let Some(name) = root.file_name() {
            return sanitize_component(&name.to_string_lossy());
        }
    }

    cwd.file_name()
        .map(|n| sanitize_component(&n.to_string_lossy()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn find_git_root(start: &Path) -> Option<std::path::PathBuf> {
    let mut cursor = Some(start.to_path_buf());
    while let Some(dir) = cursor {
        if dir.join(".git").exists() {
            return Some(dir);
        }
        cursor = dir.parent().map(Path::to_path_buf);
    }
    None
}

/// Sanitize a project/ID component to the allowlist. Underscores become
/// hyphens so the component cannot be confused with an ID separator.
fn sanitize_component(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '&' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

/// Next 3-digit sequence for a date + project: max existing + 1.
fn next_sequence(index: &ChunkIndex, date: &str, project: &str) -> u32 {
    let prefix = format!("{date}_{project}_");
    index
        .chunks
        .iter()
        .filter_map(|c| {
            let rest = c.id.strip_prefix(&prefix)?;
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            digits.parse::<u32>().ok()
        })
        .max()
        .unwrap_or(0)
        + 1
}

// ── Entity extraction ─────────────────────────────────────────────────────────

const MAX_ENTITIES: usize = 50;

const FILE_EXTENSIONS: &str =
    "py|rs|js|ts|jsx|tsx|md|xml|json|css|html|yml|yaml|toml|cfg|conf|sh|sql|csv";

fn file_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(
            r"(?:[A-Za-z0-9_.\-]+/)*[A-Za-z0-9_\-]+\.(?:{FILE_EXTENSIONS})\b"
        ))
        .expect("file regex")
    })
}

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\bv\d+(?:\.\d+)*\b").expect("version regex"))
}

fn semver_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d+\.\d+\.\d+(?:\.\d+)*\b").expect("semver regex"))
}

fn snake_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[a-z][a-z0-9]*(?:_[a-z0-9]+)+\b").expect("snake regex"))
}

fn dotted_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[a-z][a-z0-9_]*(?:\.[a-z][a-z0-9_]+)+\b").expect("dotted regex")
    })
}

fn ticket_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z]{2,}-\d+\b").expect("ticket regex"))
}

fn issue_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#\d+\b").expect("issue regex"))
}

fn func_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\(\)").expect("func regex"))
}

/// Regex-based extraction of files, versions, modules, tickets and
/// functions from chunk content. Capped at [`MAX_ENTITIES`] total,
/// distributed in category order.
pub(crate) fn extract_entities(content: &str) -> Entities {
    if content.trim().is_empty() {
        return Entities::default();
    }

    let mut files: BTreeSet<String> = BTreeSet::new();
    for m in file_re().find_iter(content) {
        files.insert(m.as_str().to_string());
    }

    let mut versions: BTreeSet<String> = BTreeSet::new();
    for m in version_re().find_iter(content) {
        versions.insert(m.as_str().to_string());
    }
    for m in semver_re().find_iter(content) {
        let v = m.as_str();
        // Skip YYYY.MM.DD date lookalikes
        if Regex::new(r"^\d{4}\.\d{2}\.\d{2}$").unwrap().is_match(v) {
            continue;
        }
        versions.insert(v.to_string());
    }

    let mut modules: BTreeSet<String> = BTreeSet::new();
    for m in snake_re().find_iter(content) {
        if m.as_str().len() >= 2 {
            modules.insert(m.as_str().to_string());
        }
    }
    for m in dotted_re().find_iter(content) {
        let candidate = m.as_str();
        // Bare filenames already land in `files`
        let is_file = candidate
            .rsplit('.')
            .next()
            .map(|ext| FILE_EXTENSIONS.split('|').any(|known| known == ext))
            .unwrap_or(false);
        if !is_file && candidate.len() >= 2 {
            modules.insert(candidate.to_string());
        }
    }

    let mut tickets: BTreeSet<String> = BTreeSet::new();
    for m in ticket_re().find_iter(content) {
        tickets.insert(m.as_str().to_string());
    }
    for m in issue_re().find_iter(content) {
        tickets.insert(m.as_str().to_string());
    }

    let mut functions: BTreeSet<String> = BTreeSet::new();
    for m in func_re().find_iter(content) {
        let name = m.as_str().trim_end_matches("()");
        if name.len() > 1 && !matches!(name, "if" | "for" | "in") {
            functions.insert(format!("{name}()"));
        }
    }

    // Enforce the global cap in category order
    let mut remaining = MAX_ENTITIES;
    let mut take = |set: BTreeSet<String>| -> Vec<String> {
        let taken: Vec<String> = set.into_iter().take(remaining).collect();
        remaining -= taken.len();
        taken
    };

    Entities {
        files: take(files),
        versions: take(versions),
        modules: take(modules),
        tickets: take(tickets),
        functions: take(functions),
    }
}
