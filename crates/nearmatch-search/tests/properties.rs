//! Universal properties of the scoring engines.

use nearmatch_core::model::{HashFamily, PerceptualHash, PerceptualHashSet};
use nearmatch_search::fusion::{HashCandidate, compare, hamming_distance, rank_candidates};
use nearmatch_search::semantic::{cosine_similarity, find_similar};
use proptest::prelude::*;

const DIM: usize = 8;

fn arb_unit_vector() -> impl Strategy<Value = Vec<f32>> {
    prop::collection::vec(-1.0_f32..1.0, DIM)
        .prop_filter("needs a usable norm", |v| {
            v.iter().map(|x| x * x).sum::<f32>() > 1e-3
        })
        .prop_map(|v| {
            let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            v.into_iter().map(|x| x / norm).collect()
        })
}

/// A 64-bit hash (16 hex digits).
fn arb_hash() -> impl Strategy<Value = PerceptualHash> {
    prop::collection::vec(any::<u8>(), 8)
        .prop_map(|bytes| PerceptualHash::from_bytes(bytes).expect("non-empty"))
}

/// A hash set where each family is independently present or absent.
fn arb_hash_set() -> impl Strategy<Value = PerceptualHashSet> {
    (
        prop::option::of(arb_hash()),
        prop::option::of(arb_hash()),
        prop::option::of(arb_hash()),
        prop::option::of(arb_hash()),
    )
        .prop_map(|(phash, ahash, dhash, whash)| PerceptualHashSet {
            phash,
            ahash,
            dhash,
            whash,
            ..PerceptualHashSet::default()
        })
}

proptest! {
    #[test]
    fn self_similarity_is_one(v in arb_unit_vector()) {
        let score = cosine_similarity(&v, &v).expect("same length");
        prop_assert!((score - 1.0).abs() < 1e-5, "score {}", score);
    }

    #[test]
    fn similarity_is_bounded_and_symmetric(a in arb_unit_vector(), b in arb_unit_vector()) {
        let ab = cosine_similarity(&a, &b).expect("same length");
        let ba = cosine_similarity(&b, &a).expect("same length");
        prop_assert!((0.0..=1.0).contains(&ab));
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn find_similar_is_sorted_thresholded_and_truncated(
        query in arb_unit_vector(),
        candidates in prop::collection::vec(arb_unit_vector(), 0..40),
        threshold in 0.0_f32..=1.0,
        top_k in prop::option::of(1_usize..10),
    ) {
        let ids: Vec<String> = (0..candidates.len()).map(|i| format!("c{i}")).collect();
        let results = find_similar(&query, &candidates, &ids, threshold, top_k)
            .expect("valid input");

        prop_assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        prop_assert!(results.iter().all(|m| m.score >= threshold));
        if let Some(k) = top_k {
            prop_assert!(results.len() <= k);
        }

        // Equal scores appear in candidate order.
        for pair in results.windows(2) {
            if pair[0].score == pair[1].score {
                let left: usize = pair[0].id[1..].parse().expect("numeric id");
                let right: usize = pair[1].id[1..].parse().expect("numeric id");
                prop_assert!(left < right);
            }
        }
    }

    #[test]
    fn hamming_self_distance_is_zero(h in arb_hash()) {
        prop_assert_eq!(hamming_distance(&h, &h), Ok(0));
    }

    #[test]
    fn hamming_is_symmetric_and_bounded(a in arb_hash(), b in arb_hash()) {
        let ab = hamming_distance(&a, &b).expect("same width");
        prop_assert_eq!(Ok(ab), hamming_distance(&b, &a));
        prop_assert!(ab <= 64);
    }

    #[test]
    fn compare_is_symmetric(a in arb_hash_set(), b in arb_hash_set(), threshold in 0.0_f64..64.0) {
        let ab = compare(&a, &b, threshold).expect("same widths");
        let ba = compare(&b, &a, threshold).expect("same widths");
        prop_assert_eq!(ab.is_duplicate, ba.is_duplicate);
        prop_assert_eq!(ab.weighted_score, ba.weighted_score);
        prop_assert_eq!(ab.distances, ba.distances);
    }

    #[test]
    fn compare_only_scores_shared_families(a in arb_hash_set(), b in arb_hash_set()) {
        let result = compare(&a, &b, 10.0).expect("same widths");
        for family in HashFamily::ALL {
            let shared = a.get(family).is_some() && b.get(family).is_some();
            prop_assert_eq!(result.distances.contains_key(&family), shared);
        }
        if result.is_undetermined() {
            prop_assert!(!result.is_duplicate);
        } else {
            prop_assert!(result.weighted_score <= 64.0);
        }
    }

    #[test]
    fn ranking_is_ascending_and_all_duplicates(
        target in arb_hash_set(),
        sets in prop::collection::vec(arb_hash_set(), 0..30),
        threshold in 0.0_f64..40.0,
    ) {
        let candidates: Vec<HashCandidate> = sets
            .into_iter()
            .enumerate()
            .map(|(i, hashes)| HashCandidate::new(format!("img-{i}"), hashes))
            .collect();
        let ranked = rank_candidates(&target, &candidates, threshold).expect("valid");

        prop_assert!(ranked.windows(2).all(|w| w[0].weighted_score <= w[1].weighted_score));
        prop_assert!(ranked.iter().all(|m| m.weighted_score <= threshold));
        prop_assert!(ranked.iter().all(|m| !m.distances.is_empty()));
    }
}
