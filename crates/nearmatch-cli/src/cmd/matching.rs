//! `nearmatch match`: semantic and visual duplicate detection for entities.

use anyhow::Result;
use clap::{Args, ValueEnum};
use nearmatch_core::MatchError;
use nearmatch_core::config::{FusionPolicy, ProjectConfig};
use nearmatch_core::model::ReportFields;
use nearmatch_core::producer::{HashEmbedder, TextEmbedder, embed_or_zero};
use nearmatch_search::{EntityMatch, EntitySignals, MatchOrchestrator, MatchStrength};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::input::{HashSetInput, InputArgs};
use crate::output::{OutputMode, fmt_score, pretty_kv, pretty_section, render_mode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    Either,
    Both,
    SemanticOnly,
    VisualOnly,
}

impl From<PolicyArg> for FusionPolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::Either => Self::Either,
            PolicyArg::Both => Self::Both,
            PolicyArg::SemanticOnly => Self::SemanticOnly,
            PolicyArg::VisualOnly => Self::VisualOnly,
        }
    }
}

#[derive(Args, Debug)]
#[command(
    about = "Find duplicates of an entity using text and image signals",
    long_about = "Compare a target entity with candidates. Each entity may carry an\n\
                  embedding (or text / report fields, embedded with the built-in\n\
                  feature-hashing embedder) and a perceptual hash set.",
    after_help = "INPUT:\n    {\"target\": {\"id\": \"r-1\", \"text\": \"..\", \"hashes\": {\"phash\": \"..\"}},\n     \
                  \"candidates\": [{\"id\": \"r-2\", \"embedding\": [..]}, ...]}\n\n\
                  EXAMPLES:\n    nearmatch match --input entities.json --policy both --json"
)]
pub struct MatchArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// How semantic and visual verdicts combine. Defaults to `matching.policy`.
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,
}

#[derive(Debug, Deserialize)]
struct EntityInput {
    id: String,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    report: Option<ReportFields>,
    #[serde(default)]
    hashes: Option<HashSetInput>,
}

impl EntityInput {
    /// Resolve to engine input; an explicit embedding wins over text, and
    /// text wins over report fields.
    fn into_signals<E: TextEmbedder>(self, embedder: &E) -> Result<EntitySignals, MatchError> {
        let embedding = self.embedding.or_else(|| {
            let text = self
                .text
                .or_else(|| self.report.as_ref().map(ReportFields::embedding_text))?;
            debug!(id = %self.id, "embedding entity text");
            Some(embed_or_zero(embedder, &text))
        });
        Ok(EntitySignals {
            id: self.id,
            embedding,
            hashes: self.hashes.map(HashSetInput::decode).transpose()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MatchInput {
    target: EntityInput,
    #[serde(default)]
    candidates: Vec<EntityInput>,
}

#[derive(Debug, Serialize)]
struct MatchOutput {
    target: String,
    policy: FusionPolicy,
    count: usize,
    matches: Vec<EntityMatch>,
}

pub fn run_match(args: &MatchArgs, config: &ProjectConfig, output: OutputMode) -> Result<()> {
    let mut config = config.clone();
    if let Some(policy) = args.policy {
        config.matching.policy = policy.into();
    }
    let orchestrator = MatchOrchestrator::from_config(&config)?;
    let embedder = HashEmbedder::new(config.semantic.dimension);

    let doc: MatchInput = args.input.read()?;
    let target = doc.target.into_signals(&embedder)?;
    let candidates = doc
        .candidates
        .into_iter()
        .map(|candidate| candidate.into_signals(&embedder))
        .collect::<Result<Vec<_>, MatchError>>()?;

    let matches = orchestrator.find_duplicates(&target, &candidates)?;
    let result = MatchOutput {
        target: target.id,
        policy: config.matching.policy,
        count: matches.len(),
        matches,
    };

    render_mode(
        output,
        &result,
        |out, w| {
            for m in &out.matches {
                writeln!(
                    w,
                    "{}  {}  {}  {}",
                    m.id,
                    strength_label(m.strength),
                    semantic_cell(m),
                    visual_cell(m)
                )?;
            }
            Ok(())
        },
        |out, w| {
            pretty_section(w, &format!("Duplicates of {} ({})", out.target, out.count))?;
            if out.matches.is_empty() {
                writeln!(w, "No duplicates found.")?;
            }
            for m in &out.matches {
                pretty_kv(w, &m.id, strength_label(m.strength))?;
                pretty_kv(w, "  semantic", semantic_cell(m))?;
                pretty_kv(w, "  visual", visual_cell(m))?;
            }
            Ok(())
        },
    )
}

const fn strength_label(strength: MatchStrength) -> &'static str {
    match strength {
        MatchStrength::LikelyDuplicate => "likely_duplicate",
        MatchStrength::PossiblyRelated => "possibly_related",
        MatchStrength::None => "none",
    }
}

fn semantic_cell(m: &EntityMatch) -> String {
    m.semantic
        .map_or_else(|| "-".to_string(), |score| fmt_score(f64::from(score)))
}

fn visual_cell(m: &EntityMatch) -> String {
    match &m.visual {
        Some(visual) if !visual.is_undetermined() => fmt_score(visual.weighted_score),
        Some(_) => "undetermined".to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_embedding_wins_over_text() {
        let embedder = HashEmbedder::new(4);
        let entity = EntityInput {
            id: "r-1".into(),
            embedding: Some(vec![1.0, 0.0, 0.0, 0.0]),
            text: Some("ignored".into()),
            report: None,
            hashes: None,
        };
        let signals = entity.into_signals(&embedder).expect("no hashes");
        assert_eq!(signals.embedding, Some(vec![1.0, 0.0, 0.0, 0.0]));
    }

    #[test]
    fn report_fields_are_embedded() {
        let embedder = HashEmbedder::new(16);
        let report = ReportFields {
            scammer_name: Some("Ján".into()),
            ..ReportFields::default()
        };
        let entity = EntityInput {
            id: "r-2".into(),
            embedding: None,
            text: None,
            report: Some(report.clone()),
            hashes: None,
        };
        let signals = entity.into_signals(&embedder).expect("no hashes");
        assert_eq!(
            signals.embedding,
            Some(embed_or_zero(&embedder, &report.embedding_text()))
        );
    }

    #[test]
    fn entity_without_text_has_no_embedding() {
        let entity: EntityInput =
            serde_json::from_str(r#"{"id":"img","hashes":{"phash":"ff00"}}"#)
                .expect("valid entity");
        let signals = entity
            .into_signals(&HashEmbedder::new(8))
            .expect("valid hashes");
        assert!(signals.embedding.is_none());
        assert!(signals.hashes.is_some());
    }

    #[test]
    fn bad_entity_hash_is_an_invalid_hash() {
        let entity: EntityInput =
            serde_json::from_str(r#"{"id":"img","hashes":{"phash":"not-hex"}}"#)
                .expect("valid json");
        let err = entity.into_signals(&HashEmbedder::new(8)).unwrap_err();
        assert!(matches!(err, MatchError::InvalidHash(_)));
    }

    #[test]
    fn policy_arg_maps_to_fusion_policy() {
        assert_eq!(FusionPolicy::from(PolicyArg::SemanticOnly), FusionPolicy::SemanticOnly);
        assert_eq!(FusionPolicy::from(PolicyArg::Both), FusionPolicy::Both);
    }
}
