#![no_main]

use libfuzzer_sys::fuzz_target;
use nearmatch_core::model::PerceptualHashSet;
use nearmatch_search::fusion::compare;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Some((left, right)) = text.split_once('\n') else {
        return;
    };
    let (Ok(a), Ok(b)) = (
        serde_json::from_str::<PerceptualHashSet>(left),
        serde_json::from_str::<PerceptualHashSet>(right),
    ) else {
        return;
    };

    let forward = compare(&a, &b, 10.0);
    let backward = compare(&b, &a, 10.0);
    match (forward, backward) {
        (Ok(x), Ok(y)) => {
            assert_eq!(x.distances, y.distances);
            assert!(x.weighted_score >= 0.0);
            assert_eq!(x.is_duplicate, y.is_duplicate);
        }
        (Err(_), Err(_)) => {}
        _ => panic!("comparison must fail symmetrically"),
    }
});
