//! Safe I/O primitives — atomic writes, advisory locks, traversal-safe
//! paths, normalized hashing, and bounded gzip decompression.
//!
//! Every JSON index mutation in the crate goes through
//! [`with_locked_json`], which holds an exclusive `flock` on a sibling
//! `.lock` file for the whole read-modify-write window and commits the new
//! document with [`atomic_write`]. Two processes racing on the same index
//! therefore serialize on the lock, and a crash mid-write leaves the old
//! document intact.

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::warn;

use crate::error::{MemoryError, Result};

/// Maximum chunk content size accepted at creation (2 MiB).
pub const MAX_CHUNK_CONTENT_SIZE: usize = 2 * 1024 * 1024;

/// Maximum size produced by gzip decompression (10 MiB).
pub const MAX_DECOMPRESSED_SIZE: usize = 10 * 1024 * 1024;

/// Maximum accepted chunk ID length.
pub const MAX_ID_LEN: usize = 200;

/// Validate a chunk ID against the `[A-Za-z0-9_.&-]` allowlist.
///
/// Blocks slashes, `..` sequences, null bytes and anything else that could
/// steer a path outside the storage root.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(MemoryError::InvalidId(id.to_string()));
    }
    let ok = id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '&' | '-'));
    if !ok {
        return Err(MemoryError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Build `base/{id}{ext}`, rejecting IDs that fail validation.
///
/// The allowlist already excludes path separators, so the joined path cannot
/// leave `base`; the component check is kept as a second line of defense.
pub fn resolve_in(base: &Path, id: &str, ext: &str) -> Result<PathBuf> {
    validate_id(id)?;
    let path = base.join(format!("{id}{ext}"));
    check_within(base, &path)?;
    Ok(path)
}

/// Resolve a relative path from an index entry against the storage root.
///
/// Absolute paths and `..` components yield [`MemoryError::PathEscape`].
pub fn resolve_rel(root: &Path, rel: &str) -> Result<PathBuf> {
    let rel_path = Path::new(rel);
    if rel_path.is_absolute() {
        return Err(MemoryError::PathEscape(rel_path.to_path_buf()));
    }
    for component in rel_path.components() {
        match component {
            Component::Normal(_) => {}
            _ => return Err(MemoryError::PathEscape(rel_path.to_path_buf())),
        }
    }
    let joined = root.join(rel_path);
    check_within(root, &joined)?;
    Ok(joined)
}

/// Verify that `path` stays under `base` once both are canonicalized.
/// The target file may not exist yet, so the check canonicalizes parents.
fn check_within(base: &Path, path: &Path) -> Result<()> {
    let canon_base = canonicalize_existing(base);
    let parent = path.parent().unwrap_or(base);
    let canon_parent = canonicalize_existing(parent);
    if canon_parent.starts_with(&canon_base) {
        Ok(())
    } else {
        Err(MemoryError::PathEscape(path.to_path_buf()))
    }
}

/// Canonicalize a path that may not exist yet by walking up to the nearest
/// existing ancestor and re-appending the remainder.
fn canonicalize_existing(path: &Path) -> PathBuf {
    if let Ok(canon) = path.canonicalize() {
        return canon;
    }
    let mut tail = Vec::new();
    let mut cursor = path.to_path_buf();
    while let Some(parent) = cursor.parent().map(Path::to_path_buf) {
        if let Some(name) = cursor.file_name() {
            tail.push(name.to_os_string());
        }
        if let Ok(canon) = parent.canonicalize() {
            let mut result = canon;
            for part in tail.iter().rev() {
                result.push(part);
            }
            return result;
        }
        cursor = parent;
    }
    path.to_path_buf()
}

/// Write bytes atomically: temp file in the same directory, fsync, rename.
///
/// On failure the temp file is dropped (and unlinked); the target is never
/// left half-written.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| MemoryError::PathEscape(path.to_path_buf()))?;
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| MemoryError::Io(e.error))?;
    Ok(())
}

/// RAII exclusive advisory lock on a file.
///
/// The lock is released when the guard drops, on every exit path including
/// unwinding.
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Acquire an exclusive lock, blocking until available.
    pub fn acquire(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(path)?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = fs2::FileExt::unlock(&self.file) {
            warn!(error = %e, "failed to release file lock");
        }
    }
}

/// Read a JSON document, falling back to `default` when the file is absent.
pub fn read_json_or<T>(path: &Path, default: impl FnOnce() -> T) -> Result<T>
where
    T: DeserializeOwned,
{
    if !path.exists() {
        return Ok(default());
    }
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Locked read-modify-write on a JSON document.
///
/// Acquires an exclusive lock on `<path>.lock`, loads the document (or the
/// default), runs `body`, and writes the result back atomically. If `body`
/// errors, nothing is written.
pub fn with_locked_json<T, R>(
    path: &Path,
    default: impl FnOnce() -> T,
    body: impl FnOnce(&mut T) -> Result<R>,
) -> Result<R>
where
    T: Serialize + DeserializeOwned,
{
    let lock_path = lock_path_for(path);
    let _guard = FileLock::acquire(&lock_path)?;

    let mut doc = read_json_or(path, default)?;
    let out = body(&mut doc)?;
    atomic_write(path, &serde_json::to_vec_pretty(&doc)?)?;
    Ok(out)
}

/// Sibling lock file path: `index.json` → `index.json.lock`.
fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".lock");
    PathBuf::from(name)
}

/// SHA-256 of text lowercased with whitespace runs collapsed to single
/// spaces and trimmed. Catches near-duplicates that differ only in casing
/// or formatting.
pub fn sha256_normalized(text: &str) -> String {
    let normalized = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let digest = Sha256::digest(normalized.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Gzip-compress bytes into a buffer.
pub fn gzip_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

/// Streaming gzip decompression, aborting once the output exceeds
/// [`MAX_DECOMPRESSED_SIZE`]. Protects against decompression bombs.
pub fn gunzip_bounded(path: &Path, max_bytes: usize) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut decoder = flate2::read::GzDecoder::new(file);
    let mut out = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = decoder.read(&mut buf)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
        if out.len() > max_bytes {
            return Err(MemoryError::InvalidSize {
                actual: out.len(),
                limit: max_bytes,
            });
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn accepts_valid_ids() {
        for id in ["2026-01-18_rlm_001", "a.b&c-d_e", "legacy_001", "X"] {
            assert!(validate_id(id).is_ok(), "{id} should be valid");
        }
    }

    #[test]
    fn rejects_traversal_ids() {
        for id in ["../../etc/passwd", "a/b", "", "a\0b", "a b"] {
            assert!(validate_id(id).is_err(), "{id:?} should be rejected");
        }
        let too_long = "a".repeat(MAX_ID_LEN + 1);
        assert!(validate_id(&too_long).is_err());
    }

    #[test]
    fn resolve_rel_blocks_escapes() {
        let dir = TempDir::new().unwrap();
        assert!(resolve_rel(dir.path(), "chunks/ok.md").is_ok());
        assert!(matches!(
            resolve_rel(dir.path(), "../outside.md"),
            Err(MemoryError::PathEscape(_))
        ));
        assert!(matches!(
            resolve_rel(dir.path(), "/etc/passwd"),
            Err(MemoryError::PathEscape(_))
        ));
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("data.json");
        atomic_write(&target, b"first").unwrap();
        atomic_write(&target, b"second").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"second");
        // no stray temp files
        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn locked_json_update_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("counter.json");

        let value = with_locked_json(
            &path,
            || serde_json::json!({"n": 0}),
            |doc| {
                doc["n"] = serde_json::json!(doc["n"].as_i64().unwrap() + 1);
                Ok(doc["n"].as_i64().unwrap())
            },
        )
        .unwrap();
        assert_eq!(value, 1);

        let doc: serde_json::Value = read_json_or(&path, || serde_json::json!({})).unwrap();
        assert_eq!(doc["n"], 1);
    }

    #[test]
    fn locked_json_error_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.json");
        atomic_write(&path, b"{\"n\": 42}").unwrap();

        let result: Result<()> = with_locked_json(
            &path,
            || serde_json::json!({}),
            |doc| {
                doc["n"] = serde_json::json!(0);
                Err(MemoryError::NotFound("nope".into()))
            },
        );
        assert!(result.is_err());

        let doc: serde_json::Value = read_json_or(&path, || serde_json::json!({})).unwrap();
        assert_eq!(doc["n"], 42);
    }

    #[test]
    fn normalized_hash_ignores_case_and_whitespace() {
        let a = sha256_normalized("Hello   World\n");
        let b = sha256_normalized("hello world");
        let c = sha256_normalized("hello worlds");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn gzip_roundtrip_and_bound() {
        let dir = TempDir::new().unwrap();
        let gz = dir.path().join("data.gz");

        let payload = b"some chunk content".repeat(100);
        atomic_write(&gz, &gzip_bytes(&payload).unwrap()).unwrap();

        let restored = gunzip_bounded(&gz, MAX_DECOMPRESSED_SIZE).unwrap();
        assert_eq!(restored, payload);

        // A cap below the payload size trips the bound
        let err = gunzip_bounded(&gz, 64).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidSize { .. }));
    }
}
