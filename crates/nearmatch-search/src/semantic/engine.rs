//! Dimension-bound front end over the free similarity functions.

use nearmatch_core::MatchError;
use nearmatch_core::config::SemanticConfig;
use tracing::instrument;

use super::{SimilarityMatch, centroid, search, similarity};

/// Embedding width of the MiniLM-class models this workspace is tuned for.
pub const DEFAULT_DIMENSION: usize = 384;

/// Semantic similarity engine for one embedding dimension.
///
/// Holds only its dimension, so it is cheap to construct per test or per
/// request and safe to share across threads by reference. Every vector passed
/// in must have exactly [`dimension`](Self::dimension) components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorSimilarityEngine {
    dimension: usize,
}

impl Default for VectorSimilarityEngine {
    fn default() -> Self {
        Self {
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl VectorSimilarityEngine {
    /// # Errors
    ///
    /// [`MatchError::InvalidDimension`] when `dimension` is zero.
    pub const fn new(dimension: usize) -> Result<Self, MatchError> {
        if dimension == 0 {
            return Err(MatchError::InvalidDimension);
        }
        Ok(Self { dimension })
    }

    /// # Errors
    ///
    /// [`MatchError::InvalidDimension`] when the configured dimension is zero.
    pub const fn from_config(config: &SemanticConfig) -> Result<Self, MatchError> {
        Self::new(config.dimension)
    }

    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// See [`similarity::cosine_similarity`].
    ///
    /// # Errors
    ///
    /// [`MatchError::DimensionMismatch`] when either vector is not
    /// [`dimension`](Self::dimension) long.
    pub fn cosine_similarity(&self, a: &[f32], b: &[f32]) -> Result<f32, MatchError> {
        self.check(a)?;
        self.check(b)?;
        similarity::cosine_similarity(a, b)
    }

    /// See [`similarity::batch_cosine_similarity`].
    ///
    /// # Errors
    ///
    /// [`MatchError::DimensionMismatch`] when the query or any candidate is
    /// not [`dimension`](Self::dimension) long.
    #[instrument(skip_all, fields(candidates = candidates.len()))]
    pub fn batch_cosine_similarity<C>(
        &self,
        query: &[f32],
        candidates: &[C],
    ) -> Result<Vec<f32>, MatchError>
    where
        C: AsRef<[f32]> + Sync,
    {
        self.check(query)?;
        similarity::batch_cosine_similarity(query, candidates)
    }

    /// See [`search::find_similar`].
    ///
    /// # Errors
    ///
    /// As [`search::find_similar`], plus [`MatchError::DimensionMismatch`]
    /// when the query is not [`dimension`](Self::dimension) long.
    #[instrument(
        skip_all,
        fields(
            candidates = candidates.len(),
            threshold = f64::from(threshold),
            top_k = ?top_k
        )
    )]
    pub fn find_similar<C, S>(
        &self,
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
        self.check(query)?;
        search::find_similar(query, candidates, ids, threshold, top_k)
    }

    /// See [`centroid::compute_centroid`]; empty input yields the zero vector
    /// of this engine's dimension.
    ///
    /// # Errors
    ///
    /// [`MatchError::DimensionMismatch`] for a vector of the wrong length.
    #[instrument(skip_all, fields(vectors = vectors.len()))]
    pub fn compute_centroid<C: AsRef<[f32]>>(&self, vectors: &[C]) -> Result<Vec<f32>, MatchError> {
        centroid::compute_centroid(vectors, self.dimension)
    }

    const fn check(&self, vector: &[f32]) -> Result<(), MatchError> {
        if vector.len() == self.dimension {
            Ok(())
        } else {
            Err(MatchError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            VectorSimilarityEngine::new(0),
            Err(MatchError::InvalidDimension)
        );
    }

    #[test]
    fn default_matches_config_default() {
        let engine = VectorSimilarityEngine::from_config(&SemanticConfig::default())
            .expect("default config is valid");
        assert_eq!(engine, VectorSimilarityEngine::default());
        assert_eq!(engine.dimension(), DEFAULT_DIMENSION);
    }

    #[test]
    fn pairwise_checks_configured_dimension() {
        let engine = VectorSimilarityEngine::new(3).expect("positive dimension");
        let err = engine.cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]).unwrap_err();
        assert_eq!(
            err,
            MatchError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    fn query_dimension_checked_even_without_candidates() {
        let engine = VectorSimilarityEngine::new(3).expect("positive dimension");
        let candidates: Vec<Vec<f32>> = Vec::new();
        let ids: Vec<String> = Vec::new();
        assert!(engine
            .find_similar(&[1.0], &candidates, &ids, 0.5, None)
            .is_err());
        assert!(engine
            .find_similar(&[1.0, 0.0, 0.0], &candidates, &ids, 0.5, None)
            .expect("valid")
            .is_empty());
    }

    #[test]
    fn empty_centroid_has_engine_dimension() {
        let engine = VectorSimilarityEngine::new(4).expect("positive dimension");
        let vectors: Vec<Vec<f32>> = Vec::new();
        assert_eq!(engine.compute_centroid(&vectors).expect("empty"), vec![0.0; 4]);
    }

    #[test]
    fn batch_scores_against_query() {
        let engine = VectorSimilarityEngine::new(2).expect("positive dimension");
        let scores = engine
            .batch_cosine_similarity(&[1.0, 0.0], &[vec![1.0_f32, 0.0], vec![0.0, 1.0]])
            .expect("dims agree");
        assert_eq!(scores, vec![1.0, 0.0]);
    }
}
