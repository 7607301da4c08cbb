//! `nearmatch config`: show the effective configuration.

use anyhow::{Context, Result};
use nearmatch_core::config::EffectiveConfig;

use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

pub fn run_config(effective: &EffectiveConfig, output: OutputMode) -> Result<()> {
    let project_toml =
        toml::to_string_pretty(&effective.project).context("Failed to encode project config")?;

    render_mode(
        output,
        effective,
        |_, w| write!(w, "{project_toml}"),
        |cfg, w| {
            pretty_section(w, "Effective configuration")?;
            pretty_kv(w, "output", &cfg.resolved_output)?;
            pretty_kv(w, "policy", format!("{:?}", cfg.project.matching.policy))?;
            writeln!(w)?;
            write!(w, "{project_toml}")
        },
    )
}
