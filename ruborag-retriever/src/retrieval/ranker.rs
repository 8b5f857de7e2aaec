//! Brute-force cosine ranking over every stored vector.

use crate::storage::StoredVector;
use serde::Serialize;

/// One ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub source_id: String,
    pub chunk_index: i64,
    pub score: f32,
}

/// Cosine similarity of two vectors, accumulated in `f64`.
///
/// Returns `0.0` when the lengths differ, either vector is empty, either has
/// zero norm, or the result is not finite.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = (dot_product / (norm_a.sqrt() * norm_b.sqrt())) as f32;
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Scores every record against `query` and returns the best `k`.
///
/// Results are ordered by descending score, with ties broken by source id and
/// then chunk index so equal scores always come back in the same order.
/// `threshold`, when given, drops results scoring below it.
pub fn rank(
    query: &[f32],
    records: &[StoredVector],
    k: usize,
    threshold: Option<f32>,
) -> Vec<ScoredChunk> {
    let mut scored: Vec<ScoredChunk> = records
        .iter()
        .map(|record| ScoredChunk {
            source_id: record.source_id.clone(),
            chunk_index: record.chunk_index,
            score: cosine_similarity(query, &record.vector),
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.source_id.cmp(&b.source_id))
            .then_with(|| a.chunk_index.cmp(&b.chunk_index))
    });
    scored.truncate(k.min(records.len()));

    if let Some(min_score) = threshold {
        scored.retain(|hit| hit.score >= min_score);
    }

    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(source: &str, index: i64, vector: &[f32]) -> StoredVector {
        StoredVector {
            source_id: source.to_string(),
            chunk_index: index,
            vector: vector.to_vec(),
        }
    }

    #[test]
    fn test_cosine_similarity() {
        // Identical vectors
        assert!((cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]) - 1.0).abs() < 1e-6);

        // Orthogonal vectors
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);

        // Opposite vectors
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]), -1.0);

        // Non-trivial angle
        let similarity = cosine_similarity(&[0.6, 0.8], &[0.8, 0.6]);
        assert!((similarity - 0.96).abs() < 1e-6);

        // Zero vector
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);

        // Different lengths
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);

        // Empty
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_cosine_similarity_is_symmetric() {
        let a = [0.3, -1.2, 4.5, 0.01];
        let b = [2.0, 0.5, -0.7, 9.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn test_rank_orders_by_score_and_clamps_k() {
        // Scores against [1, 0] are 0.9, 0.5, 0.1 by construction.
        let records = vec![
            record("low.txt", 0, &[0.1, (1.0f32 - 0.01).sqrt()]),
            record("high.txt", 0, &[0.9, (1.0f32 - 0.81).sqrt()]),
            record("mid.txt", 0, &[0.5, (1.0f32 - 0.25).sqrt()]),
        ];

        let top = rank(&[1.0, 0.0], &records, 2, None);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].source_id, "high.txt");
        assert_eq!(top[1].source_id, "mid.txt");
        assert!((top[0].score - 0.9).abs() < 1e-6);
        assert!((top[1].score - 0.5).abs() < 1e-6);

        let all = rank(&[1.0, 0.0], &records, 10, None);
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].source_id, "low.txt");
    }

    #[test]
    fn test_rank_single_document_scenario() {
        let records = vec![record("doc.txt", 0, &[1.0, 0.0]), record("doc.txt", 1, &[0.0, 1.0])];

        let top = rank(&[1.0, 0.0], &records, 1, None);
        assert_eq!(
            top,
            vec![ScoredChunk {
                source_id: "doc.txt".to_string(),
                chunk_index: 0,
                score: 1.0,
            }]
        );
    }

    #[test]
    fn test_rank_ties_are_deterministic() {
        let records = vec![
            record("b.txt", 1, &[1.0, 0.0]),
            record("a.txt", 2, &[1.0, 0.0]),
            record("b.txt", 0, &[1.0, 0.0]),
            record("a.txt", 0, &[1.0, 0.0]),
        ];

        let keys: Vec<_> = rank(&[1.0, 0.0], &records, 4, None)
            .into_iter()
            .map(|hit| (hit.source_id, hit.chunk_index))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a.txt".to_string(), 0),
                ("a.txt".to_string(), 2),
                ("b.txt".to_string(), 0),
                ("b.txt".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_rank_threshold_and_empty_input() {
        let records = vec![record("near.txt", 0, &[1.0, 0.1]), record("far.txt", 0, &[0.0, 1.0])];

        let filtered = rank(&[1.0, 0.0], &records, 5, Some(0.5));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].source_id, "near.txt");

        assert!(rank(&[1.0, 0.0], &[], 5, None).is_empty());
        assert!(rank(&[1.0, 0.0], &records, 0, None).is_empty());
    }

    #[test]
    fn test_cosine_similarity_non_finite_is_zero() {
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[f32::INFINITY, 0.0]), 0.0);
    }

    #[test]
    fn test_rank_non_finite_records_do_not_displace_real_hits() {
        // Every third record is poisoned; the rest score 1.0, 0.99, 0.98, ...
        let records: Vec<StoredVector> = (0..40)
            .map(|i| {
                let source = format!("s{i:02}.txt");
                if i % 3 == 0 {
                    record(&source, 0, &[f32::NAN, 1.0])
                } else {
                    let x = 1.0 - i as f32 / 100.0;
                    record(&source, 0, &[x, (1.0 - x * x).sqrt()])
                }
            })
            .collect();

        let top = rank(&[1.0, 0.0], &records, 5, None);
        let sources: Vec<_> = top.iter().map(|hit| hit.source_id.as_str()).collect();
        assert_eq!(sources, vec!["s01.txt", "s02.txt", "s04.txt", "s05.txt", "s07.txt"]);
        assert!(top.iter().all(|hit| hit.score.is_finite() && hit.score > 0.9));
    }

    #[test]
    fn test_rank_scores_mismatched_records_as_zero() {
        let records = vec![record("short.txt", 0, &[1.0]), record("ok.txt", 0, &[1.0, 0.0])];

        let ranked = rank(&[1.0, 0.0], &records, 2, None);
        assert_eq!(ranked[0].source_id, "ok.txt");
        assert_eq!(ranked[1].score, 0.0);
    }
}
