#![forbid(unsafe_code)]

mod cmd;
mod input;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use nearmatch_core::config::{EffectiveConfig, resolve_config};
use nearmatch_core::{ErrorCode, MatchError};
use output::{CliError, OutputMode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "nearmatch: near-duplicate detection for reports and images",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Project config file to use instead of `.nearmatch/config.toml`.
    #[arg(long = "config", id = "config_file", global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(next_help_heading = "Semantic")]
    Similarity(cmd::semantic::SimilarityArgs),

    #[command(next_help_heading = "Semantic")]
    FindSimilar(cmd::semantic::FindSimilarArgs),

    #[command(next_help_heading = "Semantic")]
    Centroid(cmd::semantic::CentroidArgs),

    #[command(next_help_heading = "Visual")]
    Hamming(cmd::visual::HammingArgs),

    #[command(next_help_heading = "Visual")]
    Compare(cmd::visual::CompareArgs),

    #[command(next_help_heading = "Visual")]
    Rank(cmd::visual::RankArgs),

    #[command(next_help_heading = "Matching")]
    Match(cmd::matching::MatchArgs),

    #[command(next_help_heading = "Matching")]
    Embed(cmd::embed::EmbedArgs),

    #[command(
        next_help_heading = "Project",
        about = "Show the effective configuration",
        after_help = "EXAMPLES:\n    nearmatch config\n\n    nearmatch config --json"
    )]
    Config,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("NEARMATCH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "nearmatch=debug,info"
        } else {
            "nearmatch=info,warn"
        })
    });

    let format = env::var("NEARMATCH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli, effective: &EffectiveConfig, output: OutputMode) -> Result<()> {
    let config = &effective.project;
    match &cli.command {
        Commands::Similarity(args) => cmd::semantic::run_similarity(args, config, output),
        Commands::FindSimilar(args) => cmd::semantic::run_find_similar(args, config, output),
        Commands::Centroid(args) => cmd::semantic::run_centroid(args, config, output),
        Commands::Hamming(args) => cmd::visual::run_hamming(args, config, output),
        Commands::Compare(args) => cmd::visual::run_compare(args, config, output),
        Commands::Rank(args) => cmd::visual::run_rank(args, config, output),
        Commands::Match(args) => cmd::matching::run_match(args, config, output),
        Commands::Embed(args) => cmd::embed::run_embed(args, config, output),
        Commands::Config => cmd::config::run_config(effective, output),
    }
}

/// Pick the machine-readable code for a failure by walking its cause chain.
fn classify(err: &anyhow::Error) -> Option<ErrorCode> {
    err.chain().find_map(|cause| {
        if let Some(match_err) = cause.downcast_ref::<MatchError>() {
            Some(match_err.code())
        } else if cause.is::<toml::de::Error>() {
            Some(ErrorCode::ConfigParseError)
        } else if cause.is::<serde_json::Error>() {
            Some(ErrorCode::InputParseError)
        } else {
            None
        }
    })
}

fn report(err: &anyhow::Error, output: OutputMode) -> ExitCode {
    debug!("command failed: {err:?}");
    let mut error = CliError::new(format!("{err:#}"));
    if let Some(code) = classify(err) {
        error = error.with_code(code);
    }
    if output::render_error(output, &error).is_err() {
        eprintln!("error: {err:#}");
    }
    ExitCode::FAILURE
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let fallback = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };

    let project_root = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => return report(&anyhow::Error::from(err), fallback),
    };

    let effective = match resolve_config(&project_root, cli.config.as_deref(), cli.json) {
        Ok(effective) => effective,
        Err(err) => return report(&err, fallback),
    };
    let output = OutputMode::from_resolved(&effective.resolved_output);

    match run(&cli, &effective, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err, output),
    }
}
