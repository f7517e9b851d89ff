//! Data model for the context store.
//!
//! Defines the chunk metadata record, the JSON index documents
//! (`index.json`, `session_memory.json`, `sessions.json`,
//! `archive_index.json`, `purge_log.json`), the insight record with its
//! [`Category`] and [`Importance`] enums, and the session registry entry.
//!
//! All references between records are by string ID; nothing here owns
//! anything else.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ── Chunks ────────────────────────────────────────────────────────────────────

/// Typed entity lists extracted from chunk content at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub tickets: Vec<String>,
    #[serde(default)]
    pub functions: Vec<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.versions.is_empty()
            && self.modules.is_empty()
            && self.tickets.is_empty()
            && self.functions.is_empty()
    }

    /// Iterate over `(type, values)` pairs in a stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[String])> {
        [
            ("files", self.files.as_slice()),
            ("versions", self.versions.as_slice()),
            ("modules", self.modules.as_slice()),
            ("tickets", self.tickets.as_slice()),
            ("functions", self.functions.as_slice()),
        ]
        .into_iter()
    }

    /// Case-insensitive substring match across every entity category.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.iter()
            .any(|(_, vals)| vals.iter().any(|v| v.to_lowercase().contains(&needle)))
    }
}

/// A chunk's metadata entry in `index.json`.
///
/// The content itself lives in `chunks/{id}.md` (or gzip-compressed under
/// `archive/` when `archived` is set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub id: String,
    /// Path relative to the storage root, e.g. `chunks/2026-01-18_rlm_001.md`.
    pub path: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub ticket: Option<String>,
    #[serde(default)]
    pub tokens_estimate: usize,
    pub content_hash: String,
    #[serde(default)]
    pub access_count: u32,
    #[serde(default)]
    pub last_accessed: Option<String>,
    #[serde(default)]
    pub entities: Entities,
    #[serde(default)]
    pub archived: bool,
}

impl ChunkMeta {
    /// `YYYY-MM-DD` date of this chunk: `created_at` prefix, falling back to
    /// the leading date of legacy IDs.
    pub fn date(&self) -> Option<&str> {
        if self.created_at.len() >= 10 {
            return Some(&self.created_at[..10]);
        }
        let id = self.id.as_str();
        if id.len() >= 10 && id.as_bytes()[4] == b'-' && id.as_bytes()[7] == b'-' {
            return Some(&id[..10]);
        }
        None
    }
}

/// `index.json` — the registry of all chunks, active and archived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkIndex {
    pub version: String,
    #[serde(default)]
    pub chunks: Vec<ChunkMeta>,
    #[serde(default)]
    pub total_tokens_estimate: usize,
}

impl Default for ChunkIndex {
    fn default() -> Self {
        Self {
            version: "2.0.0".into(),
            chunks: Vec::new(),
            total_tokens_estimate: 0,
        }
    }
}

impl ChunkIndex {
    pub fn find(&self, id: &str) -> Option<&ChunkMeta> {
        self.chunks.iter().find(|c| c.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut ChunkMeta> {
        self.chunks.iter_mut().find(|c| c.id == id)
    }

    pub fn recompute_totals(&mut self) {
        self.total_tokens_estimate = self.chunks.iter().map(|c| c.tokens_estimate).sum();
    }
}

// ── Insights ──────────────────────────────────────────────────────────────────

/// Kind of insight stored in session memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Decision,
    Fact,
    Preference,
    Finding,
    Todo,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Decision => "decision",
            Self::Fact => "fact",
            Self::Preference => "preference",
            Self::Finding => "finding",
            Self::Todo => "todo",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decision" => Ok(Self::Decision),
            "fact" => Ok(Self::Fact),
            "preference" => Ok(Self::Preference),
            "finding" => Ok(Self::Finding),
            "todo" => Ok(Self::Todo),
            "general" => Ok(Self::General),
            _ => Err(format!(
                "unknown category: {s}. Valid: decision, fact, preference, finding, todo, general"
            )),
        }
    }
}

/// Priority level of an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    Medium,
    High,
    Critical,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Importance {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!(
                "unknown importance: {s}. Valid: low, medium, high, critical"
            )),
        }
    }
}

/// A single structured memo in `session_memory.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    pub content: String,
    pub category: Category,
    pub importance: Importance,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
}

/// `session_memory.json` — the insight log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightLog {
    pub version: String,
    #[serde(default)]
    pub insights: Vec<Insight>,
    pub created_at: String,
    #[serde(default)]
    pub last_updated: Option<String>,
}

impl Default for InsightLog {
    fn default() -> Self {
        Self {
            version: "1.0.0".into(),
            insights: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
            last_updated: None,
        }
    }
}

// ── Sessions ──────────────────────────────────────────────────────────────────

/// A per-day-per-project grouping of chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub project: String,
    #[serde(default)]
    pub path: String,
    pub started: String,
    #[serde(default)]
    pub chunks: Vec<String>,
    #[serde(default)]
    pub domains: Vec<String>,
}

/// `sessions.json` — sessions keyed by `{date}_{project}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRegistry {
    pub version: String,
    #[serde(default)]
    pub sessions: BTreeMap<String, Session>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self {
            version: "1.0.0".into(),
            sessions: BTreeMap::new(),
        }
    }
}

// ── Archive & purge ───────────────────────────────────────────────────────────

/// An entry in `archive_index.json`: where an archived chunk lives plus the
/// metadata snapshot needed for immunity checks and the purge log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub id: String,
    /// Original path relative to the root.
    pub path: String,
    /// Compressed path relative to the root, e.g. `archive/{id}.md.gz`.
    pub archive_path: String,
    pub archived_at: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    #[serde(default)]
    pub access_count: u32,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

/// `archive_index.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveIndex {
    pub version: String,
    #[serde(default)]
    pub archives: Vec<ArchiveEntry>,
}

impl Default for ArchiveIndex {
    fn default() -> Self {
        Self {
            version: "1.0.0".into(),
            archives: Vec::new(),
        }
    }
}

impl ArchiveIndex {
    pub fn find(&self, id: &str) -> Option<&ArchiveEntry> {
        self.archives.iter().find(|a| a.id == id)
    }
}

/// A purged chunk's tombstone — metadata only, never content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeRecord {
    pub id: String,
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: String,
    pub archived_at: String,
    pub purged_at: String,
}

/// `purge_log.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurgeLog {
    pub version: String,
    #[serde(default)]
    pub purged: Vec<PurgeRecord>,
}

impl Default for PurgeLog {
    fn default() -> Self {
        Self {
            version: "1.0.0".into(),
            purged: Vec::new(),
        }
    }
}
