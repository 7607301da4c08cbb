//! Semantic similarity over embedding vectors.

mod centroid;
mod engine;
pub mod search;
mod similarity;

pub use centroid::compute_centroid;
pub use engine::{DEFAULT_DIMENSION, VectorSimilarityEngine};
pub use search::{SimilarityMatch, find_similar};
pub use similarity::{batch_cosine_similarity, cosine_similarity};
