//! `nearmatch similarity`, `nearmatch find-similar` and `nearmatch centroid`.

use anyhow::Result;
use clap::Args;
use nearmatch_core::config::ProjectConfig;
use nearmatch_search::semantic::{SimilarityMatch, VectorSimilarityEngine};
use serde::{Deserialize, Serialize};

use crate::input::InputArgs;
use crate::output::{OutputMode, fmt_score, pretty_kv, pretty_section, render, render_mode};

#[derive(Args, Debug)]
#[command(
    about = "Score candidates against a query embedding",
    after_help = "INPUT:\n    {\"query\": [f32, ...], \"candidates\": [[f32, ...], ...]}\n\n\
                  EXAMPLES:\n    nearmatch similarity --input pair.json --json"
)]
pub struct SimilarityArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Deserialize)]
struct SimilarityInput {
    query: Vec<f32>,
    candidates: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct SimilarityOutput {
    scores: Vec<f32>,
}

pub fn run_similarity(
    args: &SimilarityArgs,
    config: &ProjectConfig,
    output: OutputMode,
) -> Result<()> {
    let doc: SimilarityInput = args.input.read()?;
    let engine = VectorSimilarityEngine::from_config(&config.semantic)?;
    let scores = engine.batch_cosine_similarity(&doc.query, &doc.candidates)?;

    render(output, &SimilarityOutput { scores }, |out, w| {
        for score in &out.scores {
            writeln!(w, "{}", fmt_score(f64::from(*score)))?;
        }
        Ok(())
    })
}

#[derive(Args, Debug)]
#[command(
    about = "Find candidates semantically similar to a query",
    long_about = "Score every candidate embedding against the query, keep those at or\n\
                  above the threshold and order them by score (ties keep input order).",
    after_help = "INPUT:\n    {\"query\": [f32, ...], \"candidates\": [{\"id\": \"r-1\", \"embedding\": [f32, ...]}, ...]}\n\n\
                  EXAMPLES:\n    nearmatch find-similar --input search.json --threshold 0.8 --top-k 5"
)]
pub struct FindSimilarArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Minimum similarity in [0, 1]. Defaults to `semantic.threshold`.
    #[arg(long)]
    pub threshold: Option<f32>,

    /// Keep at most this many matches. Defaults to `semantic.top_k`.
    #[arg(long)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbeddedCandidate {
    id: String,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct FindSimilarInput {
    query: Vec<f32>,
    #[serde(default)]
    candidates: Vec<EmbeddedCandidate>,
}

#[derive(Debug, Serialize)]
struct FindSimilarOutput {
    threshold: f32,
    count: usize,
    matches: Vec<SimilarityMatch>,
}

pub fn run_find_similar(
    args: &FindSimilarArgs,
    config: &ProjectConfig,
    output: OutputMode,
) -> Result<()> {
    let doc: FindSimilarInput = args.input.read()?;
    let engine = VectorSimilarityEngine::from_config(&config.semantic)?;
    let threshold = args.threshold.unwrap_or(config.semantic.threshold);
    let top_k = args.top_k.or(config.semantic.top_k);

    let (ids, embeddings): (Vec<String>, Vec<Vec<f32>>) = doc
        .candidates
        .into_iter()
        .map(|candidate| (candidate.id, candidate.embedding))
        .unzip();
    let matches = engine.find_similar(&doc.query, &embeddings, &ids, threshold, top_k)?;

    let result = FindSimilarOutput {
        threshold,
        count: matches.len(),
        matches,
    };
    render_mode(
        output,
        &result,
        |out, w| {
            for m in &out.matches {
                writeln!(w, "{}  {}", m.id, fmt_score(f64::from(m.score)))?;
            }
            Ok(())
        },
        |out, w| {
            let title = format!(
                "Similar ({} >= {})",
                out.count,
                fmt_score(f64::from(out.threshold))
            );
            pretty_section(w, &title)?;
            if out.matches.is_empty() {
                writeln!(w, "No candidate met the threshold.")?;
            }
            for m in &out.matches {
                pretty_kv(w, &m.id, fmt_score(f64::from(m.score)))?;
            }
            Ok(())
        },
    )
}

#[derive(Args, Debug)]
#[command(
    about = "Compute the unit-length centroid of a cluster of embeddings",
    after_help = "INPUT:\n    {\"vectors\": [[f32, ...], ...]}\n\n\
                  An empty cluster yields the zero vector of `semantic.dimension`."
)]
pub struct CentroidArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Deserialize)]
struct CentroidInput {
    #[serde(default)]
    vectors: Vec<Vec<f32>>,
}

#[derive(Debug, Serialize)]
struct CentroidOutput {
    dimension: usize,
    centroid: Vec<f32>,
}

pub fn run_centroid(args: &CentroidArgs, config: &ProjectConfig, output: OutputMode) -> Result<()> {
    let doc: CentroidInput = args.input.read()?;
    let engine = VectorSimilarityEngine::from_config(&config.semantic)?;
    let centroid = engine.compute_centroid(&doc.vectors)?;

    render(
        output,
        &CentroidOutput {
            dimension: engine.dimension(),
            centroid,
        },
        |out, w| {
            let parts: Vec<String> = out.centroid.iter().map(ToString::to_string).collect();
            writeln!(w, "{}", parts.join(" "))
        },
    )
}
