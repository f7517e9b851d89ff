//! French/English tokenizer for BM25 ranking.
//!
//! Lowercases, strips diacritics via NFD decomposition, extracts
//! alphanumeric runs, splits hyphenated compounds, drops sub-2-char tokens
//! and a combined FR+EN stopword set. Deterministic and locale-independent.

use std::collections::HashSet;
use std::sync::OnceLock;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const STOPWORDS_FR: &[&str] = &[
    "le", "la", "les", "l", "un", "une", "des", "du", "de", "d", "et", "ou", "mais",
    "donc", "car", "que", "qui", "quoi", "je", "tu", "il", "elle", "on", "nous",
    "vous", "ils", "elles", "ce", "cette", "ces", "mon", "ton", "son", "notre",
    "votre", "leur", "est", "sont", "a", "ont", "fait", "peut", "doit", "etre",
    "avoir", "ne", "pas", "plus", "tres", "bien", "tout", "tous", "toute",
    "toutes", "pour", "dans", "sur", "avec", "sans", "par", "entre", "vers",
    "chez", "au", "aux", "si", "ni", "comme", "meme", "aussi", "encore",
];

const STOPWORDS_EN: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have",
    "has", "had", "do", "does", "did", "will", "would", "could", "should",
    "shall", "may", "might", "must", "can", "i", "you", "he", "she", "it", "we",
    "they", "this", "that", "these", "of", "in", "to", "for", "with", "on",
    "at", "by", "from", "up", "out", "and", "or", "but", "if", "not", "no",
    "yes", "so", "as", "than", "very", "too", "just", "only", "also", "about",
    "more", "some", "any", "what", "which", "who", "when", "where", "how",
    "all", "each", "both",
];

fn stopwords() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        STOPWORDS_FR
            .iter()
            .chain(STOPWORDS_EN.iter())
            .copied()
            .collect()
    })
}

/// Remove diacritics: NFD decomposition, then drop nonspacing marks
/// (`réaliste` → `realiste`).
pub fn strip_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Tokenize text for indexing and querying.
///
/// `remove_stopwords = false` keeps common words; short tokens (< 2 chars)
/// are always dropped.
pub fn tokenize(text: &str, remove_stopwords: bool) -> Vec<String> {
    let normalized = strip_accents(&text.to_lowercase());

    let mut tokens = Vec::new();
    let mut current = String::new();
    for c in normalized.chars() {
        if c.is_ascii_alphanumeric() {
            current.push(c);
        } else {
            // Hyphens inside a run join compounds; everything else ends the
            // token. Compounds are split below either way.
            if c == '-' && !current.is_empty() {
                current.push(c);
            } else if !current.is_empty() {
                flush(&mut current, &mut tokens);
            }
        }
    }
    flush(&mut current, &mut tokens);

    tokens
        .into_iter()
        .filter(|t| t.len() >= 2)
        .filter(|t| !remove_stopwords || !stopwords().contains(t.as_str()))
        .collect()
}

/// Split a raw run on hyphens and push the parts.
fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if current.is_empty() {
        return;
    }
    for part in current.split('-') {
        if !part.is_empty() {
            tokens.push(part.to_string());
        }
    }
    current.clear();
}
