//! Visual duplicate ranking.
//!
//! Lower weighted scores are better here, the inverse of semantic search
//! where higher similarity ranks first.

use nearmatch_core::MatchError;
use nearmatch_core::model::{HashFamily, PerceptualHashSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::scoring::{FusedComparison, HashWeights, compare_weighted, validate_threshold};
use crate::PARALLEL_BATCH_MIN;

/// A candidate image: caller id plus its hashes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashCandidate {
    pub id: String,
    #[serde(default)]
    pub hashes: PerceptualHashSet,
}

impl HashCandidate {
    #[must_use]
    pub fn new(id: impl Into<String>, hashes: PerceptualHashSet) -> Self {
        Self {
            id: id.into(),
            hashes,
        }
    }
}

/// A candidate that compared as a visual duplicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisualMatch {
    pub id: String,
    pub distances: BTreeMap<HashFamily, u32>,
    pub weighted_score: f64,
    pub avg_distance: f64,
}

impl VisualMatch {
    fn from_comparison(id: &str, comparison: FusedComparison) -> Option<Self> {
        let avg_distance = comparison.avg_distance()?;
        Some(Self {
            id: id.to_string(),
            distances: comparison.distances,
            weighted_score: comparison.weighted_score,
            avg_distance,
        })
    }
}

/// Compare `target` against every candidate and return the duplicates,
/// best (lowest weighted score) first. Equal scores keep input order.
///
/// # Errors
///
/// The first contract violation in candidate order: an invalid threshold or a
/// family width mismatch.
pub fn rank_candidates(
    target: &PerceptualHashSet,
    candidates: &[HashCandidate],
    threshold: f64,
) -> Result<Vec<VisualMatch>, MatchError> {
    rank_weighted(target, candidates, threshold, &HashWeights::STANDARD)
}

pub(crate) fn rank_weighted(
    target: &PerceptualHashSet,
    candidates: &[HashCandidate],
    threshold: f64,
    weights: &HashWeights,
) -> Result<Vec<VisualMatch>, MatchError> {
    validate_threshold(threshold)?;

    let compare_one =
        |candidate: &HashCandidate| compare_weighted(target, &candidate.hashes, threshold, weights);
    let outcomes: Vec<Result<FusedComparison, MatchError>> =
        if candidates.len() >= PARALLEL_BATCH_MIN {
            candidates.par_iter().map(compare_one).collect()
        } else {
            candidates.iter().map(compare_one).collect()
        };

    let mut matches = Vec::new();
    for (candidate, outcome) in candidates.iter().zip(outcomes) {
        let comparison = outcome?;
        if comparison.is_duplicate {
            matches.extend(VisualMatch::from_comparison(&candidate.id, comparison));
        }
    }

    matches.sort_by(|a, b| a.weighted_score.total_cmp(&b.weighted_score));

    debug!(
        candidates = candidates.len(),
        matched = matches.len(),
        threshold,
        "visual ranking complete"
    );
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phash(hex: &str) -> PerceptualHashSet {
        PerceptualHashSet::default()
            .with_hex(HashFamily::Phash, hex)
            .expect("valid hex")
    }

    #[test]
    fn sorts_ascending_and_drops_non_duplicates() {
        let target = phash("0000000000000000");
        let candidates = vec![
            HashCandidate::new("far", phash("ffffffffffffffff")),
            HashCandidate::new("near", phash("0000000000000003")),
            HashCandidate::new("exact", phash("0000000000000000")),
        ];

        let ranked = rank_candidates(&target, &candidates, 10.0).expect("valid");

        let ids: Vec<&str> = ranked.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "near"]);
        assert!((ranked[1].weighted_score - 1.0).abs() < 1e-9);
        assert!((ranked[1].avg_distance - 2.0).abs() < 1e-9);
    }

    #[test]
    fn ties_keep_input_order() {
        let target = phash("00");
        let candidates = vec![
            HashCandidate::new("second", phash("01")),
            HashCandidate::new("first", phash("00")),
            HashCandidate::new("third", phash("10")),
        ];
        let ranked = rank_candidates(&target, &candidates, 10.0).expect("valid");
        let ids: Vec<&str> = ranked.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn undetermined_candidates_never_rank() {
        let target = phash("00");
        let candidates = vec![
            HashCandidate::new("empty", PerceptualHashSet::default()),
            HashCandidate::new(
                "other-family",
                PerceptualHashSet::default()
                    .with_hex(HashFamily::Whash, "00")
                    .expect("valid hex"),
            ),
        ];
        assert!(rank_candidates(&target, &candidates, 1e6)
            .expect("valid")
            .is_empty());
    }

    #[test]
    fn first_width_mismatch_in_input_order_wins() {
        let target = phash("0000");
        let candidates = vec![
            HashCandidate::new("ok", phash("0001")),
            HashCandidate::new("bad-32", phash("00000000")),
            HashCandidate::new("bad-8", phash("00")),
        ];
        assert_eq!(
            rank_candidates(&target, &candidates, 10.0),
            Err(MatchError::FamilyWidthMismatch {
                family: HashFamily::Phash,
                left_bits: 16,
                right_bits: 32
            })
        );
    }

    #[test]
    fn large_batches_rank_like_small_ones() {
        let target = phash("0000");
        let candidates: Vec<HashCandidate> = (0..PARALLEL_BATCH_MIN * 2)
            .map(|i| HashCandidate::new(format!("c{i}"), phash(&format!("{:04x}", i % 16))))
            .collect();

        let ranked = rank_candidates(&target, &candidates, 1.0).expect("valid");

        assert!(ranked
            .windows(2)
            .all(|w| w[0].weighted_score <= w[1].weighted_score));
        assert_eq!(ranked[0].id, "c0");
        assert_eq!(ranked[1].id, "c16");
        assert!(ranked.iter().all(|m| m.weighted_score <= 1.0));
    }

    #[test]
    fn empty_candidate_list_is_empty() {
        assert!(rank_candidates(&phash("00"), &[], 10.0)
            .expect("valid")
            .is_empty());
    }

    #[test]
    fn candidate_without_hashes_deserializes() {
        let candidate: HashCandidate =
            serde_json::from_str(r#"{"id":"img-9"}"#).expect("hashes default to empty");
        assert!(candidate.hashes.is_empty());
    }
}
