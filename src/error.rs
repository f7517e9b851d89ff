//! Error taxonomy for the storage engine.
//!
//! Every fallible core operation returns [`MemoryError`]. Input errors
//! (`InvalidId`, `PathEscape`, `InvalidSize`, `InvalidPattern`) are returned
//! to the caller verbatim; I/O and parse failures are wrapped so raw errors
//! never cross the tool boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Tagged error kinds surfaced by the storage and search engine.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// Chunk ID fails the `[A-Za-z0-9_.&-]` allowlist or length bound.
    #[error("invalid chunk id: {0:?}")]
    InvalidId(String),

    /// A resolved path would escape the storage root.
    #[error("path escapes storage root: {}", .0.display())]
    PathEscape(PathBuf),

    /// Content exceeds the creation limit, or a gzip stream exceeds the
    /// decompression cap.
    #[error("content too large: {actual} bytes (limit {limit})")]
    InvalidSize { actual: usize, limit: usize },

    /// The requested ID exists in neither the active nor the archive zone.
    #[error("not found: {0}")]
    NotFound(String),

    /// Regex compile failure in `grep`.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// A chunk file is not valid UTF-8.
    #[error("invalid utf-8 in chunk {0}")]
    Encoding(String),

    /// File-system, lock-acquisition, or gzip failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON index file failed to serialize or parse.
    #[error("index error: {0}")]
    Index(#[from] serde_json::Error),
}

impl MemoryError {
    /// Short machine-readable tag for structured payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidId(_) => "invalid_id",
            Self::PathEscape(_) => "path_escape",
            Self::InvalidSize { .. } => "invalid_size",
            Self::NotFound(_) => "not_found",
            Self::InvalidPattern(_) => "invalid_pattern",
            Self::Encoding(_) => "encoding_error",
            Self::Io(_) => "io_error",
            Self::Index(_) => "io_error",
        }
    }
}

/// Result alias used throughout the core engine.
pub type Result<T, E = MemoryError> = std::result::Result<T, E>;
