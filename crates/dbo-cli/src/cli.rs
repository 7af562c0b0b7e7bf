//! CLI argument definitions for the DBO dataset validator.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dbo-validator",
    version,
    about = "Validate DBO employee datasets against spreadsheet-authored rules",
    long_about = "Validate defined-benefit-obligation employee datasets against\n\
                  natural-language rules authored in a spreadsheet.\n\n\
                  Rules are extracted, interpreted into typed descriptors, and\n\
                  executed deterministically: the same inputs always produce the\n\
                  same findings."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Extract and interpret rules without validating any data.
    Interpret(InterpretArgs),

    /// Validate a dataset against an interpreted rule set.
    Validate(ValidateArgs),
}

#[derive(Parser)]
pub struct InterpretArgs {
    /// Rule source: a CSV file or a directory of per-sheet CSV files.
    #[arg(value_name = "RULES")]
    pub rules: PathBuf,

    /// Ignore interpretations embedded in the rule source and re-run the
    /// heuristics for every rule.
    #[arg(long = "force-reinterpret")]
    pub force_reinterpret: bool,

    /// Reuse and persist interpreted descriptors at this path.
    #[arg(long = "cache", value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Emit the interpreted rule set as JSON on stdout.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Rule source: a CSV file or a directory of per-sheet CSV files.
    #[arg(value_name = "RULES")]
    pub rules: PathBuf,

    /// Dataset: a CSV file or a directory of per-sheet CSV files.
    #[arg(value_name = "DATA")]
    pub data: PathBuf,

    /// Minimum fuzzy similarity for matching rule fields to columns.
    #[arg(long = "threshold", value_name = "SCORE", default_value_t = 0.6)]
    pub threshold: f64,

    /// Ignore interpretations embedded in the rule source and re-run the
    /// heuristics for every rule.
    #[arg(long = "force-reinterpret")]
    pub force_reinterpret: bool,

    /// Reuse and persist interpreted descriptors at this path.
    #[arg(long = "cache", value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Emit the full validation report as JSON on stdout.
    #[arg(long = "json")]
    pub json: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
