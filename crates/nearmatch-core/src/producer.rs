//! Contracts for the external collaborators that feed the engines.
//!
//! Embedding models and image hashers live outside this workspace. They plug
//! in through [`TextEmbedder`] and [`ImageHasher`]; their failures are
//! absorbed here ([`embed_or_zero`], [`hashes_or_empty`]) so the scoring
//! engines only ever see a zero vector or an empty hash set.

use anyhow::Result;
use tracing::{debug, warn};

use crate::model::PerceptualHashSet;

/// Produces fixed-dimension embeddings for text.
///
/// Implementations must be deterministic for identical input and should
/// return L2-normalized vectors.
pub trait TextEmbedder: Send + Sync {
    /// Length of every vector this embedder returns.
    fn dimension(&self) -> usize;

    /// Embed one text.
    ///
    /// # Errors
    ///
    /// Implementation-defined inference failures.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    ///
    /// # Errors
    ///
    /// The first failure of [`embed`](Self::embed).
    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Produces perceptual hashes for an image reference (path or URL).
pub trait ImageHasher: Send + Sync {
    /// Side length the hashes are computed at; bit width is its square.
    fn hash_size(&self) -> u32;

    /// Load and hash one image.
    ///
    /// # Errors
    ///
    /// Implementation-defined load or decode failures.
    fn hash_image(&self, source: &str) -> Result<PerceptualHashSet>;
}

/// Embed `text`, substituting the zero vector for blank text, producer
/// failures, and vectors of the wrong dimension.
pub fn embed_or_zero<E: TextEmbedder + ?Sized>(embedder: &E, text: &str) -> Vec<f32> {
    let dim = embedder.dimension();
    if text.trim().is_empty() {
        return vec![0.0; dim];
    }

    match embedder.embed(text) {
        Ok(vector) if vector.len() == dim => vector,
        Ok(vector) => {
            warn!(
                expected = dim,
                actual = vector.len(),
                "embedder returned wrong dimension, substituting zero vector"
            );
            vec![0.0; dim]
        }
        Err(err) => {
            warn!("embedding failed, substituting zero vector: {err:#}");
            vec![0.0; dim]
        }
    }
}

/// Hash `source`, substituting an empty set on any failure so comparisons
/// degrade to an undetermined result.
pub fn hashes_or_empty<H: ImageHasher + ?Sized>(hasher: &H, source: &str) -> PerceptualHashSet {
    match hasher.hash_image(source) {
        Ok(hashes) => {
            debug!(source, families = hashes.families().count(), "hashed image");
            hashes
        }
        Err(err) => {
            warn!(source, "image hashing failed, using empty hash set: {err:#}");
            PerceptualHashSet::default()
        }
    }
}

/// [`hashes_or_empty`] over many sources, preserving order.
pub fn hash_all<H: ImageHasher + ?Sized>(hasher: &H, sources: &[&str]) -> Vec<PerceptualHashSet> {
    sources
        .iter()
        .map(|source| hashes_or_empty(hasher, source))
        .collect()
}

// ---------------------------------------------------------------------------
// HashEmbedder
// ---------------------------------------------------------------------------

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Model-free feature-hashing embedder.
///
/// Lowercased word tokens and their boundary-marked character trigrams are
/// hashed with FNV-1a into signed buckets, then the vector is L2-normalized.
/// Shared words and near-identical spellings land in the same buckets, which
/// is enough for tests and offline tooling; it is not a semantic model.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self { dim: 384 }
    }
}

impl HashEmbedder {
    #[must_use]
    pub const fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn accumulate(&self, vector: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        #[allow(clippy::cast_possible_truncation)]
        let bucket = (hash % self.dim as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl TextEmbedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; self.dim];
        if self.dim == 0 {
            return Ok(vector);
        }

        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            self.accumulate(&mut vector, token.as_bytes(), 1.0);

            let marked: Vec<char> = format!("#{token}#").chars().collect();
            for window in marked.windows(3) {
                let gram: String = window.iter().collect();
                self.accumulate(&mut vector, gram.as_bytes(), TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }
        Ok(vector)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{HashFamily, PerceptualHash};
    use anyhow::bail;

    struct FailingEmbedder;

    impl TextEmbedder for FailingEmbedder {
        fn dimension(&self) -> usize {
            8
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            bail!("model offline")
        }
    }

    struct ShortEmbedder;

    impl TextEmbedder for ShortEmbedder {
        fn dimension(&self) -> usize {
            8
        }

        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0; 3])
        }
    }

    struct PathHasher;

    impl ImageHasher for PathHasher {
        fn hash_size(&self) -> u32 {
            8
        }

        fn hash_image(&self, source: &str) -> Result<PerceptualHashSet> {
            if source.starts_with("missing") {
                bail!("no such file: {source}");
            }
            Ok(PerceptualHashSet::default()
                .with(HashFamily::Phash, PerceptualHash::from_hex("ffffffff00000000")?))
        }
    }

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn fnv1a_matches_reference_vectors() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn hash_embedder_is_deterministic_and_normalized() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Ponúkal falošnú investíciu").expect("embed");
        let b = embedder.embed("Ponúkal falošnú investíciu").expect("embed");
        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
        assert!((dot(&a, &a) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn hash_embedder_ranks_shared_words_higher() {
        let embedder = HashEmbedder::new(256);
        let query = embedder.embed("crypto investment scam bratislava").expect("embed");
        let near = embedder.embed("investment scam in bratislava").expect("embed");
        let far = embedder.embed("used car listing kosice").expect("embed");
        assert!(dot(&query, &near) > dot(&query, &far));
    }

    #[test]
    fn hash_embedder_blank_text_is_zero() {
        let embedder = HashEmbedder::new(16);
        let vector = embedder.embed(" ,; ").expect("embed");
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn embed_or_zero_absorbs_failures() {
        assert_eq!(embed_or_zero(&FailingEmbedder, "anything"), vec![0.0; 8]);
        assert_eq!(embed_or_zero(&ShortEmbedder, "anything"), vec![0.0; 8]);
    }

    #[test]
    fn embed_or_zero_maps_blank_text_to_zero() {
        let embedder = HashEmbedder::new(8);
        assert_eq!(embed_or_zero(&embedder, "   \t"), vec![0.0; 8]);
    }

    #[test]
    fn embed_batch_preserves_order() {
        let embedder = HashEmbedder::new(32);
        let batch = embedder.embed_batch(&["alpha", "beta"]).expect("batch");
        assert_eq!(batch[0], embedder.embed("alpha").expect("embed"));
        assert_eq!(batch[1], embedder.embed("beta").expect("embed"));
    }

    #[test]
    fn hashes_or_empty_degrades_on_failure() {
        let sets = hash_all(&PathHasher, &["a.jpg", "missing.jpg"]);
        assert_eq!(sets.len(), 2);
        assert!(!sets[0].is_empty());
        assert!(sets[1].is_empty());
    }
}
