//! Clamped cosine similarity over embedding vectors.
//!
//! Scores are the raw dot product clamped into `[0, 1]`. For unit-normalized
//! inputs that is the cosine similarity with floating overshoot past `1.0`
//! absorbed and any negative similarity collapsed to `0.0` ("unrelated").
//! Callers that need signed similarity must not use these functions.

use nearmatch_core::MatchError;
use rayon::prelude::*;

use crate::PARALLEL_BATCH_MIN;

/// Similarity between two equal-length vectors, clamped to `[0, 1]`.
///
/// A vector containing NaN yields a NaN score, which no threshold accepts.
///
/// # Errors
///
/// [`MatchError::DimensionMismatch`] when the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, MatchError> {
    if a.len() != b.len() {
        return Err(MatchError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(clamp_unit(dot(a, b)))
}

/// Score every candidate against `query`, in candidate order.
///
/// Equivalent to calling [`cosine_similarity`] per candidate. Batches of at
/// least `PARALLEL_BATCH_MIN` candidates are scored on the rayon pool; the
/// output order does not depend on that.
///
/// # Errors
///
/// [`MatchError::DimensionMismatch`] for the first candidate whose length
/// differs from the query.
pub fn batch_cosine_similarity<C>(query: &[f32], candidates: &[C]) -> Result<Vec<f32>, MatchError>
where
    C: AsRef<[f32]> + Sync,
{
    if let Some(bad) = candidates
        .iter()
        .map(AsRef::<[f32]>::as_ref)
        .find(|candidate| candidate.len() != query.len())
    {
        return Err(MatchError::DimensionMismatch {
            expected: query.len(),
            actual: bad.len(),
        });
    }

    let score = |candidate: &C| clamp_unit(dot(query, candidate.as_ref()));
    let scores: Vec<f32> = if candidates.len() >= PARALLEL_BATCH_MIN {
        candidates.par_iter().map(score).collect()
    } else {
        candidates.iter().map(score).collect()
    };
    Ok(scores)
}

/// Dot product accumulated in `f64` so long vectors don't drift.
fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_unit(value: f64) -> f32 {
    value.clamp(0.0, 1.0) as f32
}
