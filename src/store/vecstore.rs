//! Dense vector store for chunk embeddings.
//!
//! One binary file (`embeddings.bin`) holds the provider tag, the
//! dimension, an ordered list of chunk IDs, and the matching vector rows.
//! Loaded on open, rewritten atomically on every add. Search is brute-force
//! cosine over the whole store — a few thousand rows at most.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::store::fileutil::atomic_write;

#[derive(Debug, Serialize, Deserialize)]
struct VecFile {
    provider: String,
    dim: usize,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

/// Append-mostly store of `(chunk_id, vector)` rows for one provider.
pub struct VectorStore {
    path: PathBuf,
    provider: String,
    dim: usize,
    ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl VectorStore {
    /// Open the store for the active provider.
    ///
    /// If the on-disk provider tag or dimension disagrees with the active
    /// provider, the store is rebuilt empty; previously stored vectors
    /// require a backfill pass to reappear.
    pub fn open(path: &Path, provider: &str, dim: usize) -> Self {
        let mut store = Self {
            path: path.to_path_buf(),
            provider: provider.to_string(),
            dim,
            ids: Vec::new(),
            vectors: Vec::new(),
        };

        if !path.exists() {
            return store;
        }

        match std::fs::read(path).ok().and_then(|bytes| {
            bincode::deserialize::<VecFile>(&bytes).ok()
        }) {
            Some(file) if file.provider == provider && file.dim == dim => {
                store.ids = file.ids;
                store.vectors = file.vectors;
            }
            Some(file) => {
                warn!(
                    stored_provider = %file.provider,
                    stored_dim = file.dim,
                    active_provider = provider,
                    active_dim = dim,
                    "embedding store mismatch — rebuilding empty, backfill required"
                );
            }
            None => {
                warn!(path = %path.display(), "unreadable embedding store — rebuilding empty");
            }
        }
        store
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn get(&self, id: &str) -> Option<&[f32]> {
        let idx = self.ids.iter().position(|i| i == id)?;
        Some(&self.vectors[idx])
    }

    /// Add (or replace) the vector for a chunk and persist the whole store.
    pub fn add(&mut self, id: &str, vector: Vec<f32>) -> Result<()> {
        if let Some(idx) = self.ids.iter().position(|i| i == id) {
            self.vectors[idx] = vector;
        } else {
            self.ids.push(id.to_string());
            self.vectors.push(vector);
        }
        self.save()
    }

    /// Cosine similarity of `query` against every stored row, clamped to
    /// `[0, 1]`, sorted descending. Zero-norm rows and queries score 0.
    pub fn cosine_all(&self, query: &[f32]) -> Vec<(String, f64)> {
        let q_norm = norm(query);
        if q_norm == 0.0 {
            return Vec::new();
        }

        let mut results: Vec<(String, f64)> = self
            .ids
            .iter()
            .zip(self.vectors.iter())
            .filter_map(|(id, v)| {
                let v_norm = norm(v);
                if v_norm == 0.0 || v.len() != query.len() {
                    return None;
                }
                let dot: f64 = v
                    .iter()
                    .zip(query.iter())
                    .map(|(a, b)| *a as f64 * *b as f64)
                    .sum();
                let sim = (dot / (v_norm * q_norm)).clamp(0.0, 1.0);
                Some((id.clone(), sim))
            })
            .filter(|(_, sim)| *sim > 0.0)
            .collect();

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results
    }

    fn save(&self) -> Result<()> {
        let file = VecFile {
            provider: self.provider.clone(),
            dim: self.dim,
            ids: self.ids.clone(),
            vectors: self.vectors.clone(),
        };
        let bytes = bincode::serialize(&file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        atomic_write(&self.path, &bytes)
    }
}

fn norm(v: &[f32]) -> f64 {
    v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spike(dim: usize, at: usize) -> Vec<f32> {
        let mut v = vec![0.0f32; dim];
        v[at] = 1.0;
        v
    }

    #[test]
    fn add_persist_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.bin");

        let mut store = VectorStore::open(&path, "test", 8);
        store.add("a", spike(8, 0)).unwrap();
        store.add("b", spike(8, 1)).unwrap();

        let reloaded = VectorStore::open(&path, "test", 8);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.ids(), &["a".to_string(), "b".to_string()]);
        assert_eq!(reloaded.get("a").unwrap()[0], 1.0);
        assert!(reloaded.get("missing").is_none());
    }

    #[test]
    fn add_replaces_existing_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.bin");

        let mut store = VectorStore::open(&path, "test", 4);
        store.add("a", spike(4, 0)).unwrap();
        store.add("a", spike(4, 2)).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap()[2], 1.0);
    }

    #[test]
    fn cosine_ranks_nearest_first() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.bin");

        let mut store = VectorStore::open(&path, "test", 4);
        store.add("near", vec![1.0, 0.1, 0.0, 0.0]).unwrap();
        store.add("far", spike(4, 3)).unwrap();

        let results = store.cosine_all(&spike(4, 0));
        assert_eq!(results[0].0, "near");
        assert!(results[0].1 > 0.9);
        // the orthogonal row scores 0 and is dropped
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn provider_mismatch_rebuilds_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.bin");

        let mut store = VectorStore::open(&path, "model2vec", 4);
        store.add("a", spike(4, 0)).unwrap();

        let switched = VectorStore::open(&path, "fastembed", 4);
        assert!(switched.is_empty());

        let dim_changed = VectorStore::open(&path, "model2vec", 8);
        assert!(dim_changed.is_empty());

        let same = VectorStore::open(&path, "model2vec", 4);
        assert_eq!(same.len(), 1);
    }

    #[test]
    fn zero_query_returns_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("embeddings.bin");
        let mut store = VectorStore::open(&path, "test", 4);
        store.add("a", spike(4, 0)).unwrap();
        assert!(store.cosine_all(&[0.0, 0.0, 0.0, 0.0]).is_empty());
    }
}
