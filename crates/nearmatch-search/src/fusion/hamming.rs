use nearmatch_core::MatchError;
use nearmatch_core::model::PerceptualHash;

/// Number of differing bits between two hashes of the same width.
///
/// # Errors
///
/// [`MatchError::HashWidthMismatch`] when the widths differ. Hashes are never
/// truncated or padded to make them comparable.
pub fn hamming_distance(a: &PerceptualHash, b: &PerceptualHash) -> Result<u32, MatchError> {
    if a.bits() != b.bits() {
        return Err(MatchError::HashWidthMismatch {
            left_bits: a.bits(),
            right_bits: b.bits(),
        });
    }

    Ok(a.as_bytes()
        .iter()
        .zip(b.as_bytes())
        .map(|(x, y)| (x ^ y).count_ones())
        .sum())
}

/// [`hamming_distance`] over hex text.
///
/// # Errors
///
/// [`MatchError::InvalidHash`] when either side does not decode, otherwise as
/// [`hamming_distance`].
pub fn hamming_distance_hex(a: &str, b: &str) -> Result<u32, MatchError> {
    let a = PerceptualHash::from_hex(a)?;
    let b = PerceptualHash::from_hex(b)?;
    hamming_distance(&a, &b)
}
