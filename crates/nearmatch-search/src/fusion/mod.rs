//! Perceptual-hash comparison and weighted score fusion.

mod engine;
mod hamming;
mod rank;
pub mod scoring;

pub use engine::{DEFAULT_HASH_SIZE, HashFusionEngine};
pub use hamming::{hamming_distance, hamming_distance_hex};
pub use rank::{HashCandidate, VisualMatch, rank_candidates};
pub use scoring::{FusedComparison, HashWeights, UNDETERMINED_SCORE, compare};
