#![forbid(unsafe_code)]
//! nearmatch-search library.
//!
//! Scoring engines for near-duplicate detection:
//!
//! - [`semantic::VectorSimilarityEngine`]: clamped cosine similarity,
//!   threshold + top-k search and cluster centroids over embeddings.
//! - [`fusion::HashFusionEngine`]: per-family Hamming distances fused into one
//!   weighted score, duplicate verdicts and candidate ranking.
//! - [`duplicates::MatchOrchestrator`]: combines both for entity pairs.
//!
//! # Conventions
//!
//! - **Errors**: contract violations are [`nearmatch_core::MatchError`];
//!   degenerate input (no candidates, empty hash sets) is never an error.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod duplicates;
pub mod fusion;
pub mod semantic;

pub use duplicates::{EntityMatch, EntitySignals, MatchConfig, MatchOrchestrator, MatchStrength};
pub use fusion::{FusedComparison, HashCandidate, HashFusionEngine, HashWeights, VisualMatch};
pub use semantic::{SimilarityMatch, VectorSimilarityEngine};

/// Batches at least this large are scored on the rayon pool.
pub(crate) const PARALLEL_BATCH_MIN: usize = 256;
