//! Pure scoring helpers shared by the retriever: vector/lexical similarity
//! and keyword extraction. No I/O, no LLM calls — kept separate from
//! `retriever.rs` so the arithmetic is independently testable.

use std::collections::HashSet;

/// A small bilingual stop-word set. Intentionally short: the goal is to
/// drop function words, not build a full NLP pipeline.
const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "to", "of", "in", "on", "at", "for", "and",
    "or", "but", "i", "you", "he", "she", "it", "we", "they", "this", "that", "did", "do",
    "does", "我", "你", "他", "她", "们", "的", "了", "在", "是", "和", "与", "就", "都", "而",
    "及", "个", "也", "就是", "这", "那",
];

/// Cosine similarity between two equal-length dense vectors, clamped into
/// `[0, 1]` (embeddings in practice are non-negative-correlated enough that
/// negative cosine would just mean "irrelevant", not "anti-relevant" for
/// this use case). Returns `0.0` for mismatched lengths or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let norm_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Jaccard-style token-overlap similarity: `|A ∩ B| / min(|A|, |B|)`. Used
/// when an embedding is missing on either side. Zero when either side has
/// no tokens.
pub fn token_overlap_similarity(query: &str, summary: &str) -> f64 {
    let q = tokenize(query);
    let s = tokenize(summary);
    if q.is_empty() || s.is_empty() {
        return 0.0;
    }
    let intersection = q.intersection(&s).count();
    intersection as f64 / q.len().min(s.len()) as f64
}

/// Lowercase, split on non-word characters, drop stop-words, keep tokens of
/// length >= 2.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric()))
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !STOPWORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![0.3, 0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_of_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn token_overlap_is_symmetric_and_bounded() {
        let s = token_overlap_similarity("我明天去人民广场", "人民广场附近有奶茶店");
        assert!(s >= 0.0 && s <= 1.0);
    }

    #[test]
    fn token_overlap_empty_sides_is_zero() {
        assert_eq!(token_overlap_similarity("", "something"), 0.0);
        assert_eq!(token_overlap_similarity("something", ""), 0.0);
    }

    #[test]
    fn tokenize_drops_stopwords_and_short_tokens() {
        let toks = tokenize("I am a cat");
        assert!(!toks.contains("a"));
        assert!(!toks.contains("i"));
    }
}
