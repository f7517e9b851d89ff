//! In-memory Okapi BM25 index over tokenized documents.
//!
//! Built lazily per search over the active chunks and insights; the corpus
//! is small (thousands of documents), so a brute-force scorer beats the
//! bookkeeping of an incremental index. Raw scores are min-max scaled to
//! `[0, 1]` over the result set before hybrid fusion.

use std::collections::HashMap;

/// One indexed document: its key and term frequencies.
struct Doc {
    key: String,
    len: usize,
    tf: HashMap<String, usize>,
}

/// Okapi BM25 scorer with configurable `k1` and `b`.
pub struct Bm25Index {
    docs: Vec<Doc>,
    /// Document frequency per term.
    df: HashMap<String, usize>,
    total_len: usize,
    k1: f64,
    b: f64,
}

impl Bm25Index {
    pub fn new(k1: f64, b: f64) -> Self {
        Self {
            docs: Vec::new(),
            df: HashMap::new(),
            total_len: 0,
            k1,
            b,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Add a tokenized document under `key`. Empty documents are skipped.
    pub fn push(&mut self, key: impl Into<String>, tokens: &[String]) {
        if tokens.is_empty() {
            return;
        }
        let mut tf: HashMap<String, usize> = HashMap::new();
        for token in tokens {
            *tf.entry(token.clone()).or_insert(0) += 1;
        }
        for term in tf.keys() {
            *self.df.entry(term.clone()).or_insert(0) += 1;
        }
        self.total_len += tokens.len();
        self.docs.push(Doc {
            key: key.into(),
            len: tokens.len(),
            tf,
        });
    }

    /// Score every document against the query; returns `(key, score)` pairs
    /// with positive scores, sorted descending.
    pub fn score(&self, query_tokens: &[String]) -> Vec<(String, f64)> {
        if self.docs.is_empty() || query_tokens.is_empty() {
            return Vec::new();
        }

        let n = self.docs.len() as f64;
        let avgdl = self.total_len as f64 / n;

        let mut results: Vec<(String, f64)> = Vec::new();
        for doc in &self.docs {
            let mut score = 0.0;
            for term in query_tokens {
                let tf = match doc.tf.get(term) {
                    Some(&tf) => tf as f64,
                    None => continue,
                };
                let df = *self.df.get(term).unwrap_or(&0) as f64;
                let idf = (((n - df + 0.5) / (df + 0.5)) + 1.0).ln();
                let denom = tf + self.k1 * (1.0 - self.b + self.b * doc.len as f64 / avgdl);
                score += idf * tf * (self.k1 + 1.0) / denom;
            }
            if score > 0.0 {
                results.push((doc.key.clone(), score));
            }
        }

        results.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        results
    }
}

/// Min-max scale scores to `[0, 1]` over the given result set.
/// When all scores are equal, every document gets 1.0.
pub fn normalize_scores(scores: &[(String, f64)]) -> HashMap<String, f64> {
    let mut normalized = HashMap::new();
    if scores.is_empty() {
        return normalized;
    }
    let min = scores.iter().map(|(_, s)| *s).fold(f64::INFINITY, f64::min);
    let max = scores
        .iter()
        .map(|(_, s)| *s)
        .fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    for (key, score) in scores {
        let norm = if range > 0.0 { (score - min) / range } else { 1.0 };
        normalized.insert(key.clone(), norm);
    }
    normalized
}
