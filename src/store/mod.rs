//! Core storage engine — chunks, insights, sessions, retention, vectors.
//!
//! [`ContextStore`] owns the storage root and the embedding provider; the
//! operation modules ([`chunks`], [`navigation`], [`insights`],
//! [`sessions`], [`retention`]) implement the write and read paths on top
//! of the safety primitives in [`fileutil`].

pub mod chunks;
pub mod fileutil;
pub mod insights;
pub mod navigation;
pub mod retention;
pub mod sessions;
pub mod types;
pub mod vecstore;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::config::RlmConfig;
use crate::embedding::{self, EmbeddingProvider};
use crate::error::Result;
use crate::store::fileutil::read_json_or;
use crate::store::types::{ArchiveIndex, ChunkIndex, InsightLog};

/// Handle on one storage root.
///
/// All durable state lives in the files under `root`; the handle itself is
/// cheap and can be shared across threads. Multi-writer safety comes from
/// the per-file locks in [`fileutil`], not from this struct.
pub struct ContextStore {
    root: PathBuf,
    provider: Arc<dyn EmbeddingProvider>,
    config: Arc<RlmConfig>,
}

impl ContextStore {
    /// Open (and create) a storage root.
    pub fn open(
        root: impl Into<PathBuf>,
        provider: Arc<dyn EmbeddingProvider>,
        config: Arc<RlmConfig>,
    ) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join("chunks"))?;
        std::fs::create_dir_all(root.join("archive"))?;
        Ok(Self {
            root,
            provider,
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub fn config(&self) -> &RlmConfig {
        &self.config
    }

    pub fn chunks_dir(&self) -> PathBuf {
        self.root.join("chunks")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.root.join("archive")
    }

    pub fn index_file(&self) -> PathBuf {
        self.root.join("index.json")
    }

    pub fn memory_file(&self) -> PathBuf {
        self.root.join("session_memory.json")
    }

    pub fn sessions_file(&self) -> PathBuf {
        self.root.join("sessions.json")
    }

    pub fn domains_file(&self) -> PathBuf {
        self.root.join("domains.json")
    }

    pub fn archive_index_file(&self) -> PathBuf {
        self.root.join("archive_index.json")
    }

    pub fn purge_log_file(&self) -> PathBuf {
        self.root.join("purge_log.json")
    }

    pub fn embeddings_file(&self) -> PathBuf {
        self.root.join("embeddings.bin")
    }

    /// Load the chunk index (read-only, no lock).
    pub fn load_index(&self) -> Result<ChunkIndex> {
        read_json_or(&self.index_file(), ChunkIndex::default)
    }

    /// Load the archive index (read-only, no lock).
    pub fn load_archive_index(&self) -> Result<ArchiveIndex> {
        read_json_or(&self.archive_index_file(), ArchiveIndex::default)
    }
}

/// Snapshot returned by the `status` tool.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub version: String,
    pub total_insights: usize,
    pub insights_by_category: HashMap<String, usize>,
    pub insights_by_importance: HashMap<String, usize>,
    pub total_chunks: usize,
    pub active_chunks: usize,
    pub archived_chunks: usize,
    pub total_tokens_estimate: usize,
    pub embedding_provider: String,
    pub embedding_dim: usize,
    pub embedded_vectors: usize,
    pub last_updated: Option<String>,
}

/// Aggregate counters across insights, chunks and the vector store.
///
/// The only place `ProviderUnavailable` surfaces: a disabled provider shows
/// up here as `embedding_provider = "disabled"`.
pub fn status(store: &ContextStore) -> Result<StatusReport> {
    let memory: InsightLog = read_json_or(&store.memory_file(), InsightLog::default)?;
    let index = store.load_index()?;

    let mut by_category: HashMap<String, usize> = HashMap::new();
    let mut by_importance: HashMap<String, usize> = HashMap::new();
    for insight in &memory.insights {
        *by_category
            .entry(insight.category.as_str().to_string())
            .or_insert(0) += 1;
        *by_importance
            .entry(insight.importance.as_str().to_string())
            .or_insert(0) += 1;
    }

    let archived = index.chunks.iter().filter(|c| c.archived).count();
    let provider = store.provider();
    let embedded = if embedding::is_enabled(provider.as_ref()) {
        vecstore::VectorStore::open(&store.embeddings_file(), provider.name(), provider.dim())
            .len()
    } else {
        0
    };

    Ok(StatusReport {
        version: memory.version.clone(),
        total_insights: memory.insights.len(),
        insights_by_category: by_category,
        insights_by_importance: by_importance,
        total_chunks: index.chunks.len(),
        active_chunks: index.chunks.len() - archived,
        archived_chunks: archived,
        total_tokens_estimate: index.total_tokens_estimate,
        embedding_provider: provider.name().to_string(),
        embedding_dim: provider.dim(),
        embedded_vectors: embedded,
        last_updated: memory.last_updated.clone(),
    })
}
