use nearmatch_core::MatchError;
use nearmatch_core::config::{MAX_HASH_SIZE, VisualConfig};
use nearmatch_core::model::{PerceptualHash, PerceptualHashSet};
use tracing::{debug, instrument};

use super::hamming;
use super::rank::{HashCandidate, VisualMatch, rank_weighted};
use super::scoring::{FusedComparison, HashWeights, compare_weighted};

/// Hash side length used unless configured otherwise (64-bit hashes).
pub const DEFAULT_HASH_SIZE: u32 = 8;

/// Perceptual-hash comparison engine for one configured `hash_size`.
///
/// The configured size describes the hashes the caller's hasher produces.
/// Hashes wider than `hash_size²` bits are rejected, which keeps every real
/// weighted score at or below [`max_weighted_score`](Self::max_weighted_score)
/// and so below [`UNDETERMINED_SCORE`](super::UNDETERMINED_SCORE). Narrower
/// hashes still compare when both sides share a width; they are only noted
/// at debug level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HashFusionEngine {
    hash_size: u32,
    weights: HashWeights,
}

impl Default for HashFusionEngine {
    fn default() -> Self {
        Self {
            hash_size: DEFAULT_HASH_SIZE,
            weights: HashWeights::STANDARD,
        }
    }
}

impl HashFusionEngine {
    /// # Errors
    ///
    /// [`MatchError::InvalidHashSize`] unless `1 <= hash_size <= 31`.
    pub const fn new(hash_size: u32) -> Result<Self, MatchError> {
        if hash_size == 0 || hash_size > MAX_HASH_SIZE {
            return Err(MatchError::InvalidHashSize(hash_size));
        }
        Ok(Self {
            hash_size,
            weights: HashWeights::STANDARD,
        })
    }

    /// # Errors
    ///
    /// As [`new`](Self::new) for the configured `hash_size`.
    pub const fn from_config(config: &VisualConfig) -> Result<Self, MatchError> {
        Self::new(config.hash_size)
    }

    #[must_use]
    pub const fn hash_size(&self) -> u32 {
        self.hash_size
    }

    /// Bit width of hashes at the configured size (`hash_size²`).
    #[must_use]
    pub const fn hash_bits(&self) -> usize {
        (self.hash_size * self.hash_size) as usize
    }

    #[must_use]
    pub const fn weights(&self) -> &HashWeights {
        &self.weights
    }

    /// Upper bound of any real weighted score this engine reports.
    #[must_use]
    pub fn max_weighted_score(&self) -> f64 {
        f64::from(self.hash_size * self.hash_size) * self.weights.total()
    }

    /// # Errors
    ///
    /// [`MatchError::HashTooWide`] for a hash wider than the configured size,
    /// [`MatchError::HashWidthMismatch`] when the widths differ.
    pub fn hamming_distance(
        &self,
        a: &PerceptualHash,
        b: &PerceptualHash,
    ) -> Result<u32, MatchError> {
        self.check_width(a)?;
        self.check_width(b)?;
        hamming::hamming_distance(a, b)
    }

    /// # Errors
    ///
    /// [`MatchError::InvalidHash`] for undecodable text, otherwise as
    /// [`hamming_distance`](Self::hamming_distance).
    pub fn hamming_distance_hex(&self, a: &str, b: &str) -> Result<u32, MatchError> {
        let a = PerceptualHash::from_hex(a)?;
        let b = PerceptualHash::from_hex(b)?;
        self.hamming_distance(&a, &b)
    }

    /// See [`super::compare`].
    ///
    /// # Errors
    ///
    /// [`MatchError::HashTooWide`], [`MatchError::InvalidThreshold`] or
    /// [`MatchError::FamilyWidthMismatch`].
    pub fn compare(
        &self,
        a: &PerceptualHashSet,
        b: &PerceptualHashSet,
        threshold: f64,
    ) -> Result<FusedComparison, MatchError> {
        self.check_set(a)?;
        self.check_set(b)?;
        compare_weighted(a, b, threshold, &self.weights)
    }

    /// See [`super::rank_candidates`].
    ///
    /// # Errors
    ///
    /// [`MatchError::HashTooWide`] for the first oversized hash (target
    /// first, then candidates in order); otherwise the first contract
    /// violation in candidate order.
    #[instrument(skip_all, fields(candidates = candidates.len(), threshold = threshold))]
    pub fn rank_candidates(
        &self,
        target: &PerceptualHashSet,
        candidates: &[HashCandidate],
        threshold: f64,
    ) -> Result<Vec<VisualMatch>, MatchError> {
        self.check_set(target)?;
        for candidate in candidates {
            self.check_set(&candidate.hashes)?;
        }
        rank_weighted(target, candidates, threshold, &self.weights)
    }

    fn check_set(&self, set: &PerceptualHashSet) -> Result<(), MatchError> {
        set.families()
            .filter_map(|family| set.get(family))
            .try_for_each(|hash| self.check_width(hash))
    }

    fn check_width(&self, hash: &PerceptualHash) -> Result<(), MatchError> {
        let max_bits = self.hash_bits();
        if hash.bits() > max_bits {
            return Err(MatchError::HashTooWide {
                bits: hash.bits(),
                max_bits,
            });
        }
        if hash.bits() < max_bits {
            debug!(
                bits = hash.bits(),
                configured_bits = max_bits,
                "hash narrower than configured hash_size"
            );
        }
        Ok(())
    }
}
