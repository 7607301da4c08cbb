//! Threshold + top-k similarity search over a candidate set.
//!
//! Candidates and their ids are parallel slices. Every candidate is scored,
//! those below the threshold are dropped, and the rest are ordered by score
//! (highest first). Equal scores keep their candidate input order, so the
//! output is deterministic regardless of how scoring was parallelized.

use nearmatch_core::MatchError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::similarity::batch_cosine_similarity;

/// A single semantic search result with candidate id and similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityMatch {
    /// The candidate id as supplied by the caller.
    pub id: String,
    /// Similarity score in `[0, 1]` (higher = more similar).
    pub score: f32,
}

/// Find candidates scoring at least `threshold` against `query`.
///
/// Returns an empty list (not an error) for an empty candidate set or when
/// nothing qualifies. `top_k` truncates after sorting.
///
/// # Errors
///
/// - [`MatchError::InvalidThreshold`] if `threshold` is outside `[0, 1]`.
/// - [`MatchError::InvalidTopK`] if `top_k == Some(0)`.
/// - [`MatchError::LengthMismatch`] if `candidates` and `ids` differ in length.
/// - [`MatchError::DimensionMismatch`] if any candidate's length differs from
///   the query's.
pub fn find_similar<C, S>(
    query: &[f32],
    candidates: &[C],
    ids: &[S],
    threshold: f32,
    top_k: Option<usize>,
) -> Result<Vec<SimilarityMatch>, MatchError>
where
    C: AsRef<[f32]> + Sync,
    S: AsRef<str>,
{
    validate_threshold(threshold)?;
    if top_k == Some(0) {
        return Err(MatchError::InvalidTopK);
    }
    if candidates.len() != ids.len() {
        return Err(MatchError::LengthMismatch {
            candidates: candidates.len(),
            ids: ids.len(),
        });
    }
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let scores = batch_cosine_similarity(query, candidates)?;

    let mut matches: Vec<SimilarityMatch> = scores
        .into_iter()
        .zip(ids)
        .filter(|(score, _)| *score >= threshold)
        .map(|(score, id)| SimilarityMatch {
            id: id.as_ref().to_string(),
            score,
        })
        .collect();

    // `sort_by` is stable: equal scores stay in candidate order.
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    if let Some(k) = top_k {
        matches.truncate(k);
    }

    debug!(
        candidates = candidates.len(),
        matched = matches.len(),
        threshold,
        "semantic search complete"
    );
    Ok(matches)
}

pub(crate) fn validate_threshold(threshold: f32) -> Result<(), MatchError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(MatchError::InvalidThreshold {
            value: f64::from(threshold),
            expected: "[0, 1]",
        })
    }
}
