//! `nearmatch hamming`, `nearmatch compare` and `nearmatch rank`.

use anyhow::Result;
use clap::Args;
use nearmatch_core::MatchError;
use nearmatch_core::config::ProjectConfig;
use nearmatch_core::model::HashFamily;
use nearmatch_search::fusion::{FusedComparison, HashCandidate, HashFusionEngine, VisualMatch};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::input::{HashSetInput, InputArgs};
use crate::output::{OutputMode, fmt_score, pretty_kv, pretty_section, render, render_mode};

#[derive(Args, Debug)]
#[command(
    about = "Count differing bits between two hex hashes",
    after_help = "EXAMPLES:\n    nearmatch hamming f0e1d2c3b4a59687 f0e1d2c3b4a59686"
)]
pub struct HammingArgs {
    /// First hash (hex).
    pub a: String,
    /// Second hash (hex), same width as the first.
    pub b: String,
}

#[derive(Debug, Serialize)]
struct HammingOutput {
    distance: u32,
    bits: usize,
}

pub fn run_hamming(args: &HammingArgs, config: &ProjectConfig, output: OutputMode) -> Result<()> {
    let engine = HashFusionEngine::from_config(&config.visual)?;
    let distance = engine.hamming_distance_hex(&args.a, &args.b)?;
    let bits = args.a.trim().len() * 4;

    render(output, &HammingOutput { distance, bits }, |out, w| {
        writeln!(w, "{}", out.distance)
    })
}

#[derive(Args, Debug)]
#[command(
    about = "Compare two perceptual hash sets",
    long_about = "Fuse per-family Hamming distances into one weighted score\n\
                  (phash 0.5, dhash 0.3, ahash 0.15, whash 0.05) over the families\n\
                  present on both sides. Lower is more similar.",
    after_help = "INPUT:\n    {\"a\": {\"phash\": \"..\", \"dhash\": \"..\"}, \"b\": {\"phash\": \"..\"}}\n\n\
                  EXAMPLES:\n    nearmatch compare --input pair.json --threshold 8"
)]
pub struct CompareArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Duplicate cut-off on the weighted-score scale. Defaults to `visual.threshold`.
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CompareInput {
    #[serde(default)]
    a: HashSetInput,
    #[serde(default)]
    b: HashSetInput,
}

#[derive(Debug, Serialize)]
struct CompareOutput {
    is_duplicate: bool,
    undetermined: bool,
    distances: BTreeMap<HashFamily, u32>,
    weighted_score: f64,
    avg_distance: Option<f64>,
    threshold: f64,
}

impl CompareOutput {
    fn new(comparison: FusedComparison, threshold: f64) -> Self {
        Self {
            is_duplicate: comparison.is_duplicate,
            undetermined: comparison.is_undetermined(),
            avg_distance: comparison.avg_distance(),
            distances: comparison.distances,
            weighted_score: comparison.weighted_score,
            threshold,
        }
    }
}

pub fn run_compare(args: &CompareArgs, config: &ProjectConfig, output: OutputMode) -> Result<()> {
    let doc: CompareInput = args.input.read()?;
    let engine = HashFusionEngine::from_config(&config.visual)?;
    let threshold = args.threshold.unwrap_or(config.visual.threshold);
    let comparison = engine.compare(&doc.a.decode()?, &doc.b.decode()?, threshold)?;

    render_mode(
        output,
        &CompareOutput::new(comparison, threshold),
        |out, w| {
            let verdict = if out.undetermined {
                "undetermined"
            } else if out.is_duplicate {
                "duplicate"
            } else {
                "distinct"
            };
            writeln!(w, "{verdict}  {}", fmt_score(out.weighted_score))
        },
        |out, w| {
            pretty_section(w, "Visual comparison")?;
            if out.undetermined {
                pretty_kv(w, "verdict", "undetermined (no shared hash family)")?;
                return Ok(());
            }
            pretty_kv(w, "duplicate", out.is_duplicate.to_string())?;
            pretty_kv(
                w,
                "score",
                format!(
                    "{} (threshold {})",
                    fmt_score(out.weighted_score),
                    fmt_score(out.threshold)
                ),
            )?;
            for (family, distance) in &out.distances {
                pretty_kv(w, family.as_str(), distance.to_string())?;
            }
            Ok(())
        },
    )
}

#[derive(Args, Debug)]
#[command(
    about = "Rank candidate images by fused hash distance",
    after_help = "INPUT:\n    {\"target\": {\"phash\": \"..\"}, \"candidates\": [{\"id\": \"img-1\", \"hashes\": {\"phash\": \"..\"}}]}\n\n\
                  Only duplicates are listed, lowest weighted score first."
)]
pub struct RankArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Duplicate cut-off on the weighted-score scale. Defaults to `visual.threshold`.
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RankInput {
    target: HashSetInput,
    #[serde(default)]
    candidates: Vec<CandidateInput>,
}

#[derive(Debug, Deserialize)]
struct CandidateInput {
    id: String,
    #[serde(default)]
    hashes: HashSetInput,
}

#[derive(Debug, Serialize)]
struct RankOutput {
    threshold: f64,
    count: usize,
    matches: Vec<VisualMatch>,
}

pub fn run_rank(args: &RankArgs, config: &ProjectConfig, output: OutputMode) -> Result<()> {
    let doc: RankInput = args.input.read()?;
    let engine = HashFusionEngine::from_config(&config.visual)?;
    let threshold = args.threshold.unwrap_or(config.visual.threshold);
    let target = doc.target.decode()?;
    let candidates = doc
        .candidates
        .into_iter()
        .map(|candidate| Ok(HashCandidate::new(candidate.id, candidate.hashes.decode()?)))
        .collect::<Result<Vec<_>, MatchError>>()?;
    let matches = engine.rank_candidates(&target, &candidates, threshold)?;

    let result = RankOutput {
        threshold,
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
                    "{}  {}  {}",
                    m.id,
                    fmt_score(m.weighted_score),
                    fmt_score(m.avg_distance)
                )?;
            }
            Ok(())
        },
        |out, w| {
            pretty_section(w, &format!("Visual duplicates ({})", out.count))?;
            if out.matches.is_empty() {
                writeln!(w, "No candidate within {}.", fmt_score(out.threshold))?;
            }
            for m in &out.matches {
                pretty_kv(
                    w,
                    &m.id,
                    format!(
                        "{} (avg distance {})",
                        fmt_score(m.weighted_score),
                        fmt_score(m.avg_distance)
                    ),
                )?;
            }
            Ok(())
        },
    )
}
