use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "wheelscan",
    version,
    about = "Size and symbol analysis of shared libraries in a Python wheel"
)]
pub struct Args {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze the shared libraries of an extracted package
    Analyze(AnalyzeArgs),
    /// Compare current size metrics against a baseline
    Gate(GateArgs),
}

#[derive(Debug, clap::Args)]
pub struct AnalyzeArgs {
    /// Root of the extracted package
    #[arg(long)]
    pub root: PathBuf,

    /// Directory receiving the JSON reports
    #[arg(long)]
    pub output: PathBuf,

    /// Package archive the tree was extracted from
    #[arg(long)]
    pub archive: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Args)]
pub struct GateArgs {
    /// Directory holding the current analysis
    #[arg(long, default_value = "build/wheel_analysis/analysis")]
    pub analysis_dir: PathBuf,

    /// Baseline JSON file to compare against
    #[arg(long)]
    pub baseline: Option<PathBuf>,

    /// Maximum allowed growth: N% or bytes with optional K/M/G suffix
    /// [default: gate.max_growth from --config, else 5%]
    #[arg(long)]
    pub max_growth: Option<String>,

    /// JSON configuration file; its `gate` section sets the threshold and report floor
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the comparison to a JSON file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Save current sizes as the new baseline
    #[arg(long)]
    pub save_baseline: bool,
}
