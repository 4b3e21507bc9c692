//! CLI argument parsing
//!
//! # Usage
//!
//! ```bash
//! podar validate recipe.md --detailed
//! podar info recipe.md --format json --set num_epochs=20
//! podar schedule recipe.md --resolution 0.5
//! podar apply recipe.md --model model.json --output pruned.json
//! podar sensitivity --model model.json --levels 0,0.5,0.9
//! ```

mod core;
mod types;

#[cfg(test)]
mod tests;

pub use core::{
    parse_args, parse_overrides, ApplyArgs, Cli, Command, InfoArgs, ScheduleArgs,
    SensitivityArgs, ValidateArgs,
};
pub use types::OutputFormat;
