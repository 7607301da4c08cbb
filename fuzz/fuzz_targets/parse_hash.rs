#![no_main]

use libfuzzer_sys::fuzz_target;
use nearmatch_core::model::PerceptualHash;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(hash) = PerceptualHash::from_hex(text) {
        let hex = hash.to_hex();
        assert_eq!(hex.len() * 4, hash.bits());
        let reparsed = PerceptualHash::from_hex(&hex).expect("rendered hex must parse");
        assert_eq!(reparsed, hash);
    }
});
