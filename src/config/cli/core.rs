//! Core CLI types - Cli, Command, and argument structs

use clap::{Parser, Subcommand};
use serde_yaml::Value;
use std::path::PathBuf;

use super::types::OutputFormat;
use crate::recipe::{parse_override, RecipeError};

/// Podar: recipe-driven pruning schedules
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "podar")]
#[command(version)]
#[command(about = "Parse, inspect and apply pruning recipes with gradual magnitude pruning")]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Validate a recipe without applying it
    Validate(ValidateArgs),

    /// Display the resolved contents of a recipe
    Info(InfoArgs),

    /// Tabulate target sparsity and learning rate over epochs
    Schedule(ScheduleArgs),

    /// Replay a recipe over a model file and write the pruned model
    Apply(ApplyArgs),

    /// Rank a model's prunable weights by approximate pruning sensitivity
    Sensitivity(SensitivityArgs),
}

/// Arguments for the validate command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ValidateArgs {
    /// Path to recipe file (markdown with YAML front matter, or YAML)
    #[arg(value_name = "RECIPE")]
    pub recipe: PathBuf,

    /// Show detailed validation report
    #[arg(short, long)]
    pub detailed: bool,

    /// Override a recipe variable (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,
}

/// Arguments for the info command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct InfoArgs {
    /// Path to recipe file
    #[arg(value_name = "RECIPE")]
    pub recipe: PathBuf,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Override a recipe variable (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,
}

/// Arguments for the schedule command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ScheduleArgs {
    /// Path to recipe file
    #[arg(value_name = "RECIPE")]
    pub recipe: PathBuf,

    /// Optimizer steps per epoch used to replay the schedule
    #[arg(long, default_value_t = 100)]
    pub steps_per_epoch: usize,

    /// Epochs between table rows
    #[arg(short, long, default_value_t = 1.0)]
    pub resolution: f64,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Override a recipe variable (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,
}

/// Arguments for the apply command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct ApplyArgs {
    /// Path to recipe file
    #[arg(value_name = "RECIPE")]
    pub recipe: PathBuf,

    /// Model file to prune (JSON or YAML)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Where to write the pruned model
    #[arg(short, long)]
    pub output: PathBuf,

    /// Optimizer steps per epoch used to replay the schedule
    #[arg(long, default_value_t = 1)]
    pub steps_per_epoch: usize,

    /// Override a recipe variable (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub overrides: Vec<String>,
}

/// Arguments for the sensitivity command
#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SensitivityArgs {
    /// Model file to analyse (JSON or YAML)
    #[arg(short, long)]
    pub model: PathBuf,

    /// Comma-separated ascending sparsity levels
    #[arg(long, value_delimiter = ',')]
    pub levels: Vec<f32>,

    /// Output format (text, json, yaml)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Parse CLI arguments from a string slice (for testing)
pub fn parse_args<I, T>(args: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(args)
}

/// Turn repeated `--set name=value` flags into recipe overrides
pub fn parse_overrides(raw: &[String]) -> Result<Vec<(String, Value)>, RecipeError> {
    raw.iter().map(|s| parse_override(s)).collect()
}
