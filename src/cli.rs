use clap::{Args, Parser, ValueEnum};
use std::path::PathBuf;

use crate::types::config::FailurePolicy;

/// Flags shared by both tools.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Directory to write output into
    #[arg(short, long = "output_dir", visible_alias = "output-dir")]
    pub output_dir: PathBuf,

    /// Directory to read
    #[arg(short, long = "input_dir", visible_alias = "input-dir")]
    pub input_dir: PathBuf,

    /// Print the actions as shell-style commands without executing them
    #[arg(short = 'w', long = "print_only", visible_alias = "print-only")]
    pub print_only: bool,

    /// Print a summary line when finished and log each action
    #[arg(short, long)]
    pub verbose: bool,

    /// Extra TOML configuration, applied over ~/.config/readflow/config.toml and ./readflow.toml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write a JSON record of the run to this file (skipped with --print_only)
    #[arg(long)]
    pub manifest: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(
    name = "flatten-joins",
    version,
    about = "Flatten the per-sample directories created by multiple_join_paired_ends.py"
)]
pub struct FlattenCli {
    #[command(flatten)]
    pub run: RunArgs,
}

#[derive(Parser, Debug)]
#[command(
    name = "trim-reads",
    version,
    about = "Run Trimmomatic over every per-sample reads.fastq in a directory tree"
)]
pub struct TrimCli {
    #[command(flatten)]
    pub run: RunArgs,

    /// What to do when the trimming tool fails on a sample
    #[arg(long, value_enum)]
    pub on_failure: Option<OnFailure>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OnFailure {
    Continue,
    Abort,
}

impl From<OnFailure> for FailurePolicy {
    fn from(value: OnFailure) -> Self {
        match value {
            OnFailure::Continue => FailurePolicy::Continue,
            OnFailure::Abort => FailurePolicy::Abort,
        }
    }
}
