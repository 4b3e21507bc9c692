//! Command-line configuration
//!
//! Recipes are the configuration documents; this module only covers how the
//! binary is invoked and how `--set` overrides reach the recipe parser.

mod cli;

pub use cli::{
    parse_args, parse_overrides, ApplyArgs, Cli, Command, InfoArgs, OutputFormat, ScheduleArgs,
    SensitivityArgs, ValidateArgs,
};
