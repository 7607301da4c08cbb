//! Duplicate detection by combining semantic and visual signals.
//!
//! An entity carries an optional text embedding and an optional set of image
//! hashes. For each candidate:
//!
//! 1. **Semantic**: cosine similarity, only when both sides have an
//!    embedding.
//! 2. **Visual**: fused hash comparison, only when both sides have hashes.
//!
//! The [`FusionPolicy`] decides which signals count and how they combine.
//! Signals the policy ignores are not computed.
//!
//! # Match strength
//!
//! | Signal                         | Strength          |
//! |--------------------------------|-------------------|
//! | semantic >= `semantic_threshold` | `LikelyDuplicate` |
//! | semantic >= `related_threshold`  | `PossiblyRelated` |
//! | visual duplicate               | `LikelyDuplicate` |
//! | otherwise                      | `None`            |
//!
//! The reported strength is the strongest among the signals the policy uses.

use nearmatch_core::MatchError;
use nearmatch_core::config::{FusionPolicy, ProjectConfig};
use nearmatch_core::model::PerceptualHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, instrument};

use crate::PARALLEL_BATCH_MIN;
use crate::fusion::{FusedComparison, HashFusionEngine};
use crate::semantic::VectorSimilarityEngine;

/// Everything known about one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySignals {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hashes: Option<PerceptualHashSet>,
}

impl EntitySignals {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    #[must_use]
    pub fn with_hashes(mut self, hashes: PerceptualHashSet) -> Self {
        self.hashes = Some(hashes);
        self
    }
}

/// Confidence that two entities describe the same thing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrength {
    /// Almost certainly the same entity.
    LikelyDuplicate,
    /// Strong textual overlap, worth reviewing.
    PossiblyRelated,
    None,
}

impl MatchStrength {
    const fn level(self) -> u8 {
        match self {
            Self::LikelyDuplicate => 2,
            Self::PossiblyRelated => 1,
            Self::None => 0,
        }
    }

    const fn strongest(self, other: Self) -> Self {
        if other.level() > self.level() { other } else { self }
    }
}

/// Outcome of comparing a target entity with one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityMatch {
    pub id: String,
    /// Semantic similarity; absent when either side lacked an embedding or
    /// the policy ignores text.
    pub semantic: Option<f32>,
    /// Visual comparison; absent when either side lacked hashes or the policy
    /// ignores images.
    pub visual: Option<FusedComparison>,
    pub strength: MatchStrength,
    pub is_duplicate: bool,
}

/// Thresholds and policy for [`MatchOrchestrator`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub semantic_threshold: f32,
    pub related_threshold: f32,
    pub visual_threshold: f64,
    pub policy: FusionPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::from_project(&ProjectConfig::default())
    }
}

impl MatchConfig {
    #[must_use]
    pub const fn from_project(config: &ProjectConfig) -> Self {
        Self {
            semantic_threshold: config.semantic.threshold,
            related_threshold: config.semantic.related_threshold,
            visual_threshold: config.visual.threshold,
            policy: config.matching.policy,
        }
    }

    /// # Errors
    ///
    /// [`MatchError::InvalidThreshold`] for a semantic threshold outside
    /// `[0, 1]` or a negative/non-finite visual threshold.
    pub fn validate(&self) -> Result<(), MatchError> {
        crate::semantic::search::validate_threshold(self.semantic_threshold)?;
        crate::semantic::search::validate_threshold(self.related_threshold)?;
        crate::fusion::scoring::validate_threshold(self.visual_threshold)
    }

    const fn uses_semantic(&self) -> bool {
        !matches!(self.policy, FusionPolicy::VisualOnly)
    }

    const fn uses_visual(&self) -> bool {
        !matches!(self.policy, FusionPolicy::SemanticOnly)
    }
}

/// Composition point for the semantic and visual engines.
#[derive(Debug, Clone)]
pub struct MatchOrchestrator {
    semantic: VectorSimilarityEngine,
    visual: HashFusionEngine,
    config: MatchConfig,
}

impl MatchOrchestrator {
    /// # Errors
    ///
    /// [`MatchError::InvalidThreshold`] when `config` does not validate.
    pub fn new(
        semantic: VectorSimilarityEngine,
        visual: HashFusionEngine,
        config: MatchConfig,
    ) -> Result<Self, MatchError> {
        config.validate()?;
        Ok(Self {
            semantic,
            visual,
            config,
        })
    }

    /// Build both engines and the match config from project configuration.
    ///
    /// # Errors
    ///
    /// The first invalid value in `config`.
    pub fn from_config(config: &ProjectConfig) -> Result<Self, MatchError> {
        config.validate()?;
        Self::new(
            VectorSimilarityEngine::from_config(&config.semantic)?,
            HashFusionEngine::from_config(&config.visual)?,
            MatchConfig::from_project(config),
        )
    }

    #[must_use]
    pub const fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[must_use]
    pub const fn semantic_engine(&self) -> &VectorSimilarityEngine {
        &self.semantic
    }

    #[must_use]
    pub const fn visual_engine(&self) -> &HashFusionEngine {
        &self.visual
    }

    /// Compare `target` with one `candidate`, whether or not they match.
    ///
    /// # Errors
    ///
    /// Contract violations from either engine (dimension or hash width
    /// mismatch).
    pub fn compare_entities(
        &self,
        target: &EntitySignals,
        candidate: &EntitySignals,
    ) -> Result<EntityMatch, MatchError> {
        let semantic = match (&target.embedding, &candidate.embedding) {
            (Some(a), Some(b)) if self.config.uses_semantic() => {
                Some(self.semantic.cosine_similarity(a, b)?)
            }
            _ => None,
        };
        let visual = match (&target.hashes, &candidate.hashes) {
            (Some(a), Some(b)) if self.config.uses_visual() => {
                Some(self.visual.compare(a, b, self.config.visual_threshold)?)
            }
            _ => None,
        };

        let semantic_dup = semantic.is_some_and(|s| s >= self.config.semantic_threshold);
        let visual_dup = visual.as_ref().is_some_and(|v| v.is_duplicate);
        let is_duplicate = match self.config.policy {
            FusionPolicy::Either => semantic_dup || visual_dup,
            FusionPolicy::Both => semantic_dup && visual_dup,
            FusionPolicy::SemanticOnly => semantic_dup,
            FusionPolicy::VisualOnly => visual_dup,
        };

        let semantic_strength = match semantic {
            Some(s) if s >= self.config.semantic_threshold => MatchStrength::LikelyDuplicate,
            Some(s) if s >= self.config.related_threshold => MatchStrength::PossiblyRelated,
            _ => MatchStrength::None,
        };
        let visual_strength = if visual_dup {
            MatchStrength::LikelyDuplicate
        } else {
            MatchStrength::None
        };

        Ok(EntityMatch {
            id: candidate.id.clone(),
            semantic,
            visual,
            strength: semantic_strength.strongest(visual_strength),
            is_duplicate,
        })
    }

    /// Duplicates of `target` among `candidates`, strongest first.
    ///
    /// Ordered by semantic score descending, then visual weighted score
    /// ascending; a missing score sorts after any present one, and remaining
    /// ties keep candidate order.
    ///
    /// # Errors
    ///
    /// The first contract violation in candidate order.
    #[instrument(skip_all, fields(target = %target.id, candidates = candidates.len()))]
    pub fn find_duplicates(
        &self,
        target: &EntitySignals,
        candidates: &[EntitySignals],
    ) -> Result<Vec<EntityMatch>, MatchError> {
        let compare_one = |candidate: &EntitySignals| self.compare_entities(target, candidate);
        let outcomes: Vec<Result<EntityMatch, MatchError>> =
            if candidates.len() >= PARALLEL_BATCH_MIN {
                candidates.par_iter().map(compare_one).collect()
            } else {
                candidates.iter().map(compare_one).collect()
            };

        let mut matches = Vec::new();
        for outcome in outcomes {
            let found = outcome?;
            if found.is_duplicate {
                matches.push(found);
            }
        }
        matches.sort_by(match_order);

        debug!(
            duplicates = matches.len(),
            policy = ?self.config.policy,
            "duplicate search complete"
        );
        Ok(matches)
    }
}

fn match_order(a: &EntityMatch, b: &EntityMatch) -> Ordering {
    let by_semantic = match (a.semantic, b.semantic) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_semantic.then_with(|| match (visual_score(a), visual_score(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    })
}

fn visual_score(m: &EntityMatch) -> Option<f64> {
    m.visual
        .as_ref()
        .filter(|v| !v.is_undetermined())
        .map(|v| v.weighted_score)
}
