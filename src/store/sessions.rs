//! Session and domain registries.
//!
//! A session is a per-day-per-project grouping of chunks, materialized on
//! the first write of the day and appended to afterwards. Domains are
//! free-form; a curated suggestion file is created on first read and
//! unioned with every domain ever observed on a chunk.

use std::collections::BTreeSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::fileutil::{atomic_write, read_json_or, with_locked_json};
use crate::store::types::{Session, SessionRegistry};
use crate::store::ContextStore;

/// Register `chunk_id` under the `{date}_{project}` session, creating the
/// session on first write of the day. Runs under the sessions.json lock.
pub fn register_chunk(
    store: &ContextStore,
    chunk_id: &str,
    date: &str,
    project: &str,
    domain: Option<&str>,
) -> Result<()> {
    let session_id = format!("{date}_{project}");
    let cwd = std::env::current_dir()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    with_locked_json(&store.sessions_file(), SessionRegistry::default, |registry| {
        let session = registry
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| Session {
                project: project.to_string(),
                path: cwd.clone(),
                started: Utc::now().to_rfc3339(),
                chunks: Vec::new(),
                domains: Vec::new(),
            });

        if !session.chunks.iter().any(|c| c == chunk_id) {
            session.chunks.push(chunk_id.to_string());
        }
        if let Some(domain) = domain.filter(|d| !d.is_empty()) {
            if !session.domains.iter().any(|d| d == domain) {
                session.domains.push(domain.to_string());
            }
        }
        Ok(())
    })
}

/// One row of `sessions` output.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: String,
    pub project: String,
    pub started: String,
    pub chunk_count: usize,
    pub chunks: Vec<String>,
    pub domains: Vec<String>,
}

/// List sessions, newest first, optionally filtered by project or domain.
pub fn list_sessions(
    store: &ContextStore,
    project: Option<&str>,
    domain: Option<&str>,
    limit: usize,
) -> Result<Vec<SessionInfo>> {
    let registry: SessionRegistry =
        read_json_or(&store.sessions_file(), SessionRegistry::default)?;

    let mut sessions: Vec<SessionInfo> = registry
        .sessions
        .into_iter()
        .filter(|(_, s)| project.map_or(true, |p| s.project == p))
        .filter(|(_, s)| domain.map_or(true, |d| s.domains.iter().any(|sd| sd == d)))
        .map(|(id, s)| SessionInfo {
            id,
            project: s.project,
            started: s.started,
            chunk_count: s.chunks.len(),
            chunks: s.chunks,
            domains: s.domains,
        })
        .collect();

    sessions.sort_by(|a, b| b.started.cmp(&a.started));
    sessions.truncate(limit);
    Ok(sessions)
}

/// `domains.json` — curated suggestions, created with defaults on first read.
#[derive(Debug, Serialize, Deserialize)]
struct DomainsFile {
    version: String,
    description: String,
    suggested: Vec<String>,
}

impl Default for DomainsFile {
    fn default() -> Self {
        Self {
            version: "1.0.0".into(),
            description: "Suggested domains for chunks. Any free-form value is accepted; \
                          these are just suggestions."
                .into(),
            suggested: [
                "dev", "research", "planning", "debug", "test", "docs", "review",
                "deploy", "feature", "bugfix", "refactor", "meeting", "decision",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Combined domain listing returned by the `domains` tool.
#[derive(Debug, Serialize)]
pub struct DomainsReport {
    pub suggested: Vec<String>,
    /// Every domain observed on a chunk, including values outside the
    /// suggestion list.
    pub observed: Vec<String>,
}

/// Suggested domains plus everything ever observed on a chunk.
pub fn list_domains(store: &ContextStore) -> Result<DomainsReport> {
    let path = store.domains_file();
    if !path.exists() {
        atomic_write(&path, &serde_json::to_vec_pretty(&DomainsFile::default())?)?;
    }
    let domains: DomainsFile = read_json_or(&path, DomainsFile::default)?;

    let index = store.load_index()?;
    let observed: BTreeSet<String> = index
        .chunks
        .iter()
        .filter_map(|c| c.domain.clone())
        .collect();

    Ok(DomainsReport {
        suggested: domains.suggested,
        observed: observed.into_iter().collect(),
    })
}
