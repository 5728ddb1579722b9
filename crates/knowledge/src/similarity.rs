//! Cosine similarity ranking over sparse term vectors.

use crate::types::{Candidate, Document, TermVector};

/// Cosine similarity of two sparse vectors.
///
/// Returns 0.0 when either vector is empty or has zero norm. Counts are
/// non-negative, so the result lies in [0, 1].
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    // Iterate the smaller map for the dot product
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    let dot: f64 = small
        .iter()
        .filter_map(|(token, count)| large.get(token).map(|other| *count as f64 * *other as f64))
        .sum();

    let norm_a = norm(a);
    let norm_b = norm(b);
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

fn norm(vector: &TermVector) -> f64 {
    vector
        .values()
        .map(|count| (*count as f64).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Score every document against the query and keep those strictly above `threshold`.
///
/// Scan order is preserved. Documents without a vector score 0.0.
pub fn rank(documents: Vec<Document>, query_vector: &TermVector, threshold: f64) -> Vec<Candidate> {
    documents
        .into_iter()
        .filter_map(|document| {
            let score = document
                .vector
                .as_ref()
                .map(|vector| cosine_similarity(query_vector, vector))
                .unwrap_or(0.0);
            (score > threshold).then(|| Candidate::new(document, score))
        })
        .collect()
}

/// Sort best-first and keep at most `k`.
///
/// The sort is stable, so equal scores keep their scan order.
pub fn select_top_k(mut scored: Vec<Candidate>, k: usize) -> Vec<Candidate> {
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    scored
}
