use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(
    name = "bineq",
    version,
    about = "Structural build-equivalence checks for compiled binaries"
)]
pub struct Args {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Compare a baseline artifact against a candidate
    Compare(CompareArgs),
    /// Compare many components listed in a JSON manifest
    Batch(BatchArgs),
}

#[derive(Debug, ClapArgs)]
pub struct CompareArgs {
    /// Reference build artifact
    pub baseline: PathBuf,

    /// Artifact under evaluation
    pub candidate: PathBuf,

    /// Format printed to stdout (or written to --out)
    #[arg(long, default_value = "text")]
    pub format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Additionally write the JSON report here
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Additionally write the text report here
    #[arg(long)]
    pub text_out: Option<PathBuf>,

    #[command(flatten)]
    pub settings: ConfigArgs,

    /// Optional git commit hash for tool metadata
    #[arg(long)]
    pub commit: Option<String>,
}

#[derive(Debug, ClapArgs)]
pub struct BatchArgs {
    /// JSON manifest: [{"component", "baseline", "candidate"}]
    pub manifest: PathBuf,

    /// Concurrent comparisons (default: available parallelism)
    #[arg(long, short = 'j', default_value_t = 0)]
    pub jobs: usize,

    /// Stop scheduling new comparisons after the first CRITICAL result
    #[arg(long)]
    pub fail_fast: bool,

    /// Write <component>.txt and <component>.json here
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    #[command(flatten)]
    pub settings: ConfigArgs,

    /// Optional git commit hash for tool metadata
    #[arg(long)]
    pub commit: Option<String>,
}

/// Comparison settings. Flags override values from `--config`.
#[derive(Debug, ClapArgs)]
pub struct ConfigArgs {
    /// JSON configuration file
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Class whose symbols are tracked (repeatable)
    #[arg(long = "watch-class", value_name = "CLASS")]
    pub watch_class: Vec<String>,

    /// Case-insensitive substring to look up (repeatable)
    #[arg(long = "search", value_name = "TERM")]
    pub search: Vec<String>,

    /// Size delta (%) below which the result is PERFECT
    #[arg(long, value_name = "PERCENT")]
    pub size_tolerance: Option<f64>,

    /// Size delta (%) below which the result is EXCELLENT
    #[arg(long, value_name = "PERCENT")]
    pub size_warn: Option<f64>,

    /// Missing-symbol share (%) below which unwatched losses rate GOOD
    #[arg(long, value_name = "PERCENT")]
    pub missing_ratio: Option<f64>,

    /// Per-artifact introspection timeout (at least 1)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
