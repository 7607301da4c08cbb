//! Weighted fusion of per-family Hamming distances.
//!
//! # Algorithm Overview
//!
//! For every hash family present in **both** sets the Hamming distance is
//! computed, then fused with a fixed weight table:
//!
//! ```text
//! weighted_score = sum over shared families of: distance[f] * weight[f]
//! is_duplicate   = weighted_score <= threshold
//! ```
//!
//! | Family | Weight |
//! |--------|--------|
//! | phash  | 0.50   |
//! | dhash  | 0.30   |
//! | ahash  | 0.15   |
//! | whash  | 0.05   |
//!
//! Families missing on either side contribute nothing. The score is a sum,
//! not an average, so a comparison over fewer families is mechanically more
//! lenient than one over all four; thresholds are calibrated against that.
//!
//! With no shared family the comparison is *undetermined*: not a duplicate,
//! no distances, and `weighted_score` set to [`UNDETERMINED_SCORE`].
//! [`HashFusionEngine`](super::HashFusionEngine) rejects hashes wider than
//! its configured size, so real scores it reports stay below the sentinel.
//! The free functions here accept any width; with them,
//! [`FusedComparison::is_undetermined`] is the only reliable check.

use nearmatch_core::MatchError;
use nearmatch_core::model::{HashFamily, PerceptualHashSet};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::hamming::hamming_distance;

/// Weighted score reported when two hash sets share no family.
pub const UNDETERMINED_SCORE: f64 = 999.0;

/// Per-family fusion weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HashWeights {
    pub phash: f64,
    pub ahash: f64,
    pub dhash: f64,
    pub whash: f64,
}

impl HashWeights {
    /// The only table thresholds are calibrated for.
    pub const STANDARD: Self = Self {
        phash: 0.5,
        ahash: 0.15,
        dhash: 0.3,
        whash: 0.05,
    };

    #[must_use]
    pub const fn weight(&self, family: HashFamily) -> f64 {
        match family {
            HashFamily::Phash => self.phash,
            HashFamily::Ahash => self.ahash,
            HashFamily::Dhash => self.dhash,
            HashFamily::Whash => self.whash,
        }
    }

    /// Sum of all four weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        HashFamily::ALL.iter().map(|family| self.weight(*family)).sum()
    }
}

/// Outcome of comparing two hash sets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusedComparison {
    pub is_duplicate: bool,
    /// Hamming distance per family present on both sides.
    pub distances: BTreeMap<HashFamily, u32>,
    /// Fused score, lower = more similar; [`UNDETERMINED_SCORE`] when no
    /// family was shared.
    pub weighted_score: f64,
}

impl FusedComparison {
    #[must_use]
    pub const fn undetermined() -> Self {
        Self {
            is_duplicate: false,
            distances: BTreeMap::new(),
            weighted_score: UNDETERMINED_SCORE,
        }
    }

    /// `true` when the two sets shared no hash family.
    #[must_use]
    pub fn is_undetermined(&self) -> bool {
        self.distances.is_empty()
    }

    /// Mean of the computed distances, unweighted.
    #[must_use]
    pub fn avg_distance(&self) -> Option<f64> {
        if self.distances.is_empty() {
            return None;
        }
        let sum: u32 = self.distances.values().sum();
        #[allow(clippy::cast_precision_loss)]
        let count = self.distances.len() as f64;
        Some(f64::from(sum) / count)
    }
}

/// Compare two hash sets with [`HashWeights::STANDARD`].
///
/// # Errors
///
/// - [`MatchError::InvalidThreshold`] for a negative or non-finite threshold.
/// - [`MatchError::FamilyWidthMismatch`] when a shared family's hashes have
///   different widths.
pub fn compare(
    a: &PerceptualHashSet,
    b: &PerceptualHashSet,
    threshold: f64,
) -> Result<FusedComparison, MatchError> {
    compare_weighted(a, b, threshold, &HashWeights::STANDARD)
}

pub(crate) fn compare_weighted(
    a: &PerceptualHashSet,
    b: &PerceptualHashSet,
    threshold: f64,
    weights: &HashWeights,
) -> Result<FusedComparison, MatchError> {
    validate_threshold(threshold)?;

    let mut distances = BTreeMap::new();
    for family in HashFamily::ALL {
        let (Some(left), Some(right)) = (a.get(family), b.get(family)) else {
            continue;
        };
        let distance = hamming_distance(left, right).map_err(|_| {
            MatchError::FamilyWidthMismatch {
                family,
                left_bits: left.bits(),
                right_bits: right.bits(),
            }
        })?;
        distances.insert(family, distance);
    }

    if distances.is_empty() {
        debug!("no shared hash family, comparison undetermined");
        return Ok(FusedComparison::undetermined());
    }

    let weighted_score: f64 = distances
        .iter()
        .map(|(family, distance)| f64::from(*distance) * weights.weight(*family))
        .sum();

    Ok(FusedComparison {
        is_duplicate: weighted_score <= threshold,
        distances,
        weighted_score,
    })
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<(), MatchError> {
    if threshold.is_finite() && threshold >= 0.0 {
        Ok(())
    } else {
        Err(MatchError::InvalidThreshold {
            value: threshold,
            expected: "[0, inf)",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(HashFamily, &str)]) -> PerceptualHashSet {
        pairs
            .iter()
            .try_fold(PerceptualHashSet::default(), |set, (family, hex)| {
                set.with_hex(*family, hex)
            })
            .expect("valid hex")
    }

    #[test]
    fn standard_weights_sum_to_one() {
        assert!((HashWeights::STANDARD.total() - 1.0).abs() < 1e-12);
        assert!((HashWeights::STANDARD.weight(HashFamily::Dhash) - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_whash_is_not_imputed() {
        let a = set(&[
            (HashFamily::Phash, "ffff0000ffff0000"),
            (HashFamily::Dhash, "0f0f0f0f0f0f0f0f"),
            (HashFamily::Ahash, "0000000000000000"),
        ]);
        let b = set(&[
            (HashFamily::Phash, "ffff0000ffff0000"),
            (HashFamily::Dhash, "0f0f0f0f0f0f0f0f"),
            (HashFamily::Ahash, "000000000000000f"),
        ]);

        let result = compare(&a, &b, 10.0).expect("valid comparison");

        assert!(result.is_duplicate);
        assert!((result.weighted_score - 0.6).abs() < 1e-9);
        assert_eq!(result.distances.len(), 3);
        assert_eq!(result.distances[&HashFamily::Ahash], 4);
        assert!(!result.distances.contains_key(&HashFamily::Whash));
    }

    #[test]
    fn fewer_families_are_more_lenient() {
        let full_a = set(&[
            (HashFamily::Phash, "00000000000000ff"),
            (HashFamily::Dhash, "00000000000000ff"),
        ]);
        let full_b = set(&[
            (HashFamily::Phash, "0000000000000000"),
            (HashFamily::Dhash, "0000000000000000"),
        ]);
        let phash_only_b = set(&[(HashFamily::Phash, "0000000000000000")]);

        let both = compare(&full_a, &full_b, 5.0).expect("valid");
        let phash_only = compare(&full_a, &phash_only_b, 5.0).expect("valid");

        assert!((both.weighted_score - 6.4).abs() < 1e-9);
        assert!(!both.is_duplicate);
        assert!((phash_only.weighted_score - 4.0).abs() < 1e-9);
        assert!(phash_only.is_duplicate);
    }

    #[test]
    fn threshold_is_inclusive() {
        let a = set(&[(HashFamily::Phash, "0000")]);
        let b = set(&[(HashFamily::Phash, "000f")]);
        let result = compare(&a, &b, 2.0).expect("valid");
        assert!((result.weighted_score - 2.0).abs() < f64::EPSILON);
        assert!(result.is_duplicate);
    }

    #[test]
    fn no_shared_family_is_undetermined() {
        let a = set(&[(HashFamily::Phash, "ffff")]);
        let b = set(&[(HashFamily::Whash, "ffff")]);

        for result in [
            compare(&a, &b, 10.0).expect("valid"),
            compare(&a, &PerceptualHashSet::default(), 10.0).expect("valid"),
            compare(&PerceptualHashSet::default(), &PerceptualHashSet::default(), 1e9)
                .expect("valid"),
        ] {
            assert!(!result.is_duplicate);
            assert!(result.is_undetermined());
            assert!((result.weighted_score - UNDETERMINED_SCORE).abs() < f64::EPSILON);
            assert_eq!(result.avg_distance(), None);
        }
    }

    #[test]
    fn width_mismatch_names_the_family() {
        let a = set(&[(HashFamily::Phash, "ffff"), (HashFamily::Dhash, "ffff")]);
        let b = set(&[(HashFamily::Phash, "ffff"), (HashFamily::Dhash, "ffffffff")]);
        assert_eq!(
            compare(&a, &b, 10.0),
            Err(MatchError::FamilyWidthMismatch {
                family: HashFamily::Dhash,
                left_bits: 16,
                right_bits: 32
            })
        );
    }

    #[test]
    fn rejects_negative_and_nan_threshold() {
        let a = set(&[(HashFamily::Phash, "ffff")]);
        for threshold in [-0.5, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                compare(&a, &a, threshold),
                Err(MatchError::InvalidThreshold { .. })
            ));
        }
    }

    #[test]
    fn avg_distance_is_unweighted_mean() {
        let a = set(&[(HashFamily::Phash, "0000"), (HashFamily::Ahash, "0000")]);
        let b = set(&[(HashFamily::Phash, "0003"), (HashFamily::Ahash, "000f")]);
        let result = compare(&a, &b, 10.0).expect("valid");
        assert_eq!(result.avg_distance(), Some(3.0));
    }

    #[test]
    fn distances_serialize_with_family_keys() {
        let a = set(&[(HashFamily::Phash, "00"), (HashFamily::Whash, "00")]);
        let b = set(&[(HashFamily::Phash, "01"), (HashFamily::Whash, "03")]);
        let json = serde_json::to_value(compare(&a, &b, 10.0).expect("valid")).expect("serialize");
        assert_eq!(json["distances"]["phash"], 1);
        assert_eq!(json["distances"]["whash"], 2);
        assert_eq!(json["is_duplicate"], true);
    }
}
