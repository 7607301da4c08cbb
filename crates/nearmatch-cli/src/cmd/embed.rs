//! `nearmatch embed`: embed free text or report fields.

use anyhow::{Result, bail};
use clap::Args;
use nearmatch_core::config::ProjectConfig;
use nearmatch_core::model::ReportFields;
use nearmatch_core::producer::{HashEmbedder, embed_or_zero};
use serde::{Deserialize, Serialize};

use crate::input::InputArgs;
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

#[derive(Args, Debug)]
#[command(
    about = "Embed text with the built-in feature-hashing embedder",
    long_about = "Produce a deterministic, L2-normalized embedding of `semantic.dimension`\n\
                  components. Report fields are first composed into labelled text\n\
                  (Meno, Firma, Popis, ...). Blank text embeds to the zero vector.",
    after_help = "INPUT (when --text is not given):\n    {\"text\": \"..\"} or {\"report\": {\"scammer_name\": \"..\", \"description\": \"..\"}}\n\n\
                  EXAMPLES:\n    nearmatch embed --text \"crypto investment scam\" --json"
)]
pub struct EmbedArgs {
    /// Text to embed; skips reading an input document.
    #[arg(long)]
    pub text: Option<String>,

    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Deserialize)]
struct EmbedInput {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    report: Option<ReportFields>,
}

#[derive(Debug, Serialize)]
struct EmbedOutput {
    text: String,
    dimension: usize,
    embedding: Vec<f32>,
}

pub fn run_embed(args: &EmbedArgs, config: &ProjectConfig, output: OutputMode) -> Result<()> {
    let text = match &args.text {
        Some(text) => text.clone(),
        None => {
            let doc: EmbedInput = args.input.read()?;
            match (doc.text, doc.report) {
                (Some(text), _) => text,
                (None, Some(report)) => report.embedding_text(),
                (None, None) => bail!("input needs a \"text\" or \"report\" field"),
            }
        }
    };

    let embedder = HashEmbedder::new(config.semantic.dimension);
    let embedding = embed_or_zero(&embedder, &text);
    let result = EmbedOutput {
        text,
        dimension: embedding.len(),
        embedding,
    };

    render_mode(
        output,
        &result,
        |out, w| {
            let parts: Vec<String> = out.embedding.iter().map(ToString::to_string).collect();
            writeln!(w, "{}", parts.join(" "))
        },
        |out, w| {
            pretty_section(w, "Embedding")?;
            pretty_kv(w, "text", &out.text)?;
            pretty_kv(w, "dimension", out.dimension.to_string())?;
            let nonzero = out.embedding.iter().filter(|v| **v != 0.0).count();
            pretty_kv(w, "non-zero", nonzero.to_string())
        },
    )
}
