use nearmatch_core::MatchError;

/// Unit-length representative of a cluster of embeddings.
///
/// The component-wise mean is accumulated in `f64` and re-normalized to unit
/// L2 norm. A mean with zero norm (e.g. `v` and `-v` cancel) is returned as
/// is. An empty cluster yields the zero vector of length `dimension`, since
/// there is no vector to infer the length from.
///
/// # Errors
///
/// [`MatchError::DimensionMismatch`] for the first vector whose length is not
/// `dimension`.
pub fn compute_centroid<C: AsRef<[f32]>>(
    vectors: &[C],
    dimension: usize,
) -> Result<Vec<f32>, MatchError> {
    let mut sum = vec![0.0_f64; dimension];
    for vector in vectors {
        let vector = vector.as_ref();
        if vector.len() != dimension {
            return Err(MatchError::DimensionMismatch {
                expected: dimension,
                actual: vector.len(),
            });
        }
        for (acc, value) in sum.iter_mut().zip(vector) {
            *acc += f64::from(*value);
        }
    }

    if vectors.is_empty() {
        return Ok(vec![0.0; dimension]);
    }

    #[allow(clippy::cast_precision_loss)]
    let count = vectors.len() as f64;
    let norm = sum.iter().map(|v| (v / count).powi(2)).sum::<f64>().sqrt();
    let scale = if norm > 0.0 { count * norm } else { count };

    #[allow(clippy::cast_possible_truncation)]
    let centroid = sum.into_iter().map(|v| (v / scale) as f32).collect();
    Ok(centroid)
}
