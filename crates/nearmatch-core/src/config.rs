use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::Path;

use crate::error::MatchError;

/// Largest supported `hash_size`: 31² bits times the full weight table stays
/// below the undetermined-score sentinel.
pub const MAX_HASH_SIZE: u32 = 31;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub semantic: SemanticConfig,
    #[serde(default)]
    pub visual: VisualConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticConfig {
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    #[serde(default = "default_semantic_threshold")]
    pub threshold: f32,
    #[serde(default = "default_related_threshold")]
    pub related_threshold: f32,
    #[serde(default)]
    pub top_k: Option<usize>,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            dimension: default_dimension(),
            threshold: default_semantic_threshold(),
            related_threshold: default_related_threshold(),
            top_k: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualConfig {
    #[serde(default = "default_hash_size")]
    pub hash_size: u32,
    /// Duplicate cut-off on the weighted-score scale, not a raw bit count.
    #[serde(default = "default_visual_threshold")]
    pub threshold: f64,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            hash_size: default_hash_size(),
            threshold: default_visual_threshold(),
        }
    }
}

/// How semantic and visual verdicts combine into one duplicate decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionPolicy {
    /// Duplicate when either available signal says so.
    #[default]
    Either,
    /// Duplicate only when both signals are available and both agree.
    Both,
    SemanticOnly,
    VisualOnly,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingConfig {
    #[serde(default)]
    pub policy: FusionPolicy,
}

impl ProjectConfig {
    /// Check every value the engines will be built from.
    ///
    /// # Errors
    ///
    /// Returns the first [`MatchError`] an engine would raise for this config.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.semantic.dimension == 0 {
            return Err(MatchError::InvalidDimension);
        }
        for value in [self.semantic.threshold, self.semantic.related_threshold] {
            if !(0.0..=1.0).contains(&value) {
                return Err(MatchError::InvalidThreshold {
                    value: f64::from(value),
                    expected: "[0, 1]",
                });
            }
        }
        if self.semantic.top_k == Some(0) {
            return Err(MatchError::InvalidTopK);
        }
        if !(1..=MAX_HASH_SIZE).contains(&self.visual.hash_size) {
            return Err(MatchError::InvalidHashSize(self.visual.hash_size));
        }
        if !self.visual.threshold.is_finite() || self.visual.threshold < 0.0 {
            return Err(MatchError::InvalidThreshold {
                value: self.visual.threshold,
                expected: "[0, inf)",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    pub project: ProjectConfig,
    pub user: UserConfig,
    pub resolved_output: String,
}

/// Load `.nearmatch/config.toml` under `project_root`, or defaults if absent.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<ProjectConfig> {
    let path = project_root.join(".nearmatch/config.toml");
    if !path.exists() {
        return Ok(ProjectConfig::default());
    }
    load_config_file(&path)
}

/// Load a project config from an explicit path.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ProjectConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `<config_dir>/nearmatch/config.toml`, or defaults if absent.
///
/// # Errors
///
/// Fails when the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<UserConfig> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(UserConfig::default());
    };

    let path = config_dir.join("nearmatch/config.toml");
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve project config (explicit file wins over the project directory),
/// user config and the output mode.
///
/// # Errors
///
/// Fails when any config file is unreadable or malformed.
pub fn resolve_config(
    project_root: &Path,
    explicit: Option<&Path>,
    cli_json: bool,
) -> Result<EffectiveConfig> {
    let project = match explicit {
        Some(path) => load_config_file(path)?,
        None => load_project_config(project_root)?,
    };
    let user = load_user_config()?;

    let env_format = env::var("FORMAT").ok();
    let resolved_output = resolve_output(cli_json, user.output.clone(), env_format);

    Ok(EffectiveConfig {
        project,
        user,
        resolved_output,
    })
}

fn resolve_output(
    cli_json: bool,
    user_output: Option<String>,
    env_format: Option<String>,
) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "table" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}

const fn default_dimension() -> usize {
    384
}

const fn default_semantic_threshold() -> f32 {
    0.85
}

const fn default_related_threshold() -> f32 {
    0.65
}

const fn default_hash_size() -> u32 {
    8
}

const fn default_visual_threshold() -> f64 {
    10.0
}
