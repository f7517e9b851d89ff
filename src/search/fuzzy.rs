//! Partial-ratio similarity for typo-tolerant grep.
//!
//! Scores how well a needle matches the best needle-sized window of a
//! haystack, on a 0–100 scale. `partial_ratio("validaton", ...)` finds
//! lines containing "validation".

use strsim::normalized_levenshtein;

/// Best-window similarity between `needle` and `haystack`, 0–100.
///
/// Comparison is case-insensitive. Window widths one below and above the
/// needle length are scanned too, so single-character insertions and
/// deletions still align. An empty needle scores 0.
pub fn partial_ratio(needle: &str, haystack: &str) -> u8 {
    let needle: Vec<char> = needle.to_lowercase().chars().collect();
    let haystack: Vec<char> = haystack.to_lowercase().chars().collect();

    if needle.is_empty() || haystack.is_empty() {
        return 0;
    }

    let needle_str: String = needle.iter().collect();
    if haystack.len() <= needle.len() {
        let hay_str: String = haystack.iter().collect();
        return to_percent(normalized_levenshtein(&needle_str, &hay_str));
    }

    let n = needle.len();
    let widths = [n.saturating_sub(1).max(1), n, (n + 1).min(haystack.len())];

    let mut best = 0.0f64;
    for width in widths {
        for window in haystack.windows(width) {
            let window_str: String = window.iter().collect();
            let sim = normalized_levenshtein(&needle_str, &window_str);
            if sim > best {
                best = sim;
                if best >= 1.0 {
                    return 100;
                }
            }
        }
    }
    to_percent(best)
}

fn to_percent(similarity: f64) -> u8 {
    (similarity * 100.0).round().clamp(0.0, 100.0) as u8
}
