use nearmatch_core::model::report::MAX_DESCRIPTION_CHARS;
use nearmatch_core::model::{HashFamily, PerceptualHash, PerceptualHashSet, ReportFields};
use nearmatch_core::producer::{HashEmbedder, TextEmbedder, embed_or_zero};
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    // Hash parsing
    #[test]
    fn width_is_four_bits_per_digit(text in "[0-9a-fA-F]{1,64}") {
        let hash = PerceptualHash::from_hex(&text).expect("hex digits parse");
        prop_assert_eq!(hash.bits(), text.len() * 4);
        prop_assert_eq!(hash.to_hex(), text.to_lowercase());
    }

    #[test]
    fn non_hex_is_rejected(
        prefix in "[0-9a-f]{0,8}",
        bad in "[g-zG-Z]",
        suffix in "[0-9a-f]{0,8}",
    ) {
        let text = format!("{prefix}{bad}{suffix}");
        prop_assert!(PerceptualHash::from_hex(&text).is_err());
    }

    #[test]
    fn set_families_follow_canonical_order(
        phash in proptest::option::of("[0-9a-f]{16}"),
        dhash in proptest::option::of("[0-9a-f]{16}"),
        whash in proptest::option::of("[0-9a-f]{16}"),
    ) {
        let mut set = PerceptualHashSet::default();
        let inputs = [
            (HashFamily::Whash, &whash),
            (HashFamily::Phash, &phash),
            (HashFamily::Dhash, &dhash),
        ];
        for (family, hex) in inputs {
            if let Some(hex) = hex {
                set = set.with_hex(family, hex).expect("valid hex");
            }
        }
        let families: Vec<HashFamily> = set.families().collect();
        let mut sorted = families.clone();
        sorted.sort();
        prop_assert_eq!(&families, &sorted);
        prop_assert_eq!(set.is_empty(), families.is_empty());
    }

    // Report text
    #[test]
    fn description_never_exceeds_limit(description in ".{0,800}") {
        let report = ReportFields {
            description: Some(description.clone()),
            ..ReportFields::default()
        };
        let text = report.embedding_text();
        let body = text.strip_prefix("Popis: ").unwrap_or(&text);
        prop_assert!(body.chars().count() <= MAX_DESCRIPTION_CHARS + 3);
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            prop_assert!(body.ends_with("..."));
        }
    }

    // Embedding producer
    #[test]
    fn hash_embedder_is_deterministic_and_normalized(text in "[a-z ]{0,120}", dim in 1usize..64) {
        let embedder = HashEmbedder::new(dim);
        let first = embed_or_zero(&embedder, &text);
        let second = embed_or_zero(&embedder, &text);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), embedder.dimension());

        let norm = first.iter().map(|v| f64::from(*v) * f64::from(*v)).sum::<f64>().sqrt();
        prop_assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-4, "norm {}", norm);
    }
}
