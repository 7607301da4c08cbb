//! JSON input documents read from `--input <file>` or stdin.

use anyhow::{Context, Result};
use clap::Args;
use nearmatch_core::MatchError;
use nearmatch_core::model::{PerceptualHash, PerceptualHashSet};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// JSON input file. Reads stdin when omitted or `-`.
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,
}

impl InputArgs {
    /// Read and decode the input document.
    pub fn read<T: DeserializeOwned>(&self) -> Result<T> {
        match self.input.as_deref() {
            Some(path) if path != Path::new("-") => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                parse(&content, &path.display().to_string())
            }
            _ => {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .context("Failed to read stdin")?;
                parse(&content, "stdin")
            }
        }
    }
}

fn parse<T: DeserializeOwned>(content: &str, source: &str) -> Result<T> {
    serde_json::from_str(content).with_context(|| format!("Failed to parse JSON from {source}"))
}

/// A hash set as it appears in an input document.
///
/// Hex stays undecoded until [`decode`](Self::decode), so a bad digit is
/// reported as [`MatchError::InvalidHash`] instead of a JSON syntax error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HashSetInput {
    #[serde(default)]
    pub phash: Option<String>,
    #[serde(default)]
    pub ahash: Option<String>,
    #[serde(default)]
    pub dhash: Option<String>,
    #[serde(default)]
    pub whash: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
}

impl HashSetInput {
    pub fn decode(self) -> Result<PerceptualHashSet, MatchError> {
        let hash = |hex: Option<String>| hex.as_deref().map(PerceptualHash::from_hex).transpose();
        Ok(PerceptualHashSet {
            phash: hash(self.phash)?,
            ahash: hash(self.ahash)?,
            dhash: hash(self.dhash)?,
            whash: hash(self.whash)?,
            width: self.width,
            height: self.height,
            format: self.format,
        })
    }
}
