//! Podar CLI
//!
//! Inspect, validate and apply pruning recipes.
//!
//! # Usage
//!
//! ```bash
//! # Validate a recipe
//! podar validate recipe.md --detailed
//!
//! # Validate with variable overrides
//! podar validate recipe.md --set num_epochs=20 --set final_sparsity=0.9
//!
//! # Show recipe info
//! podar info recipe.md --format json
//!
//! # Print the sparsity and learning rate schedule
//! podar schedule recipe.md --steps-per-epoch 500 -r 0.5
//!
//! # Prune a model by replaying the recipe
//! podar apply recipe.md -m model.json -o pruned.json
//!
//! # Rank params by pruning sensitivity
//! podar sensitivity -m model.json
//! ```

use clap::Parser;
use podar::cli::{init_tracing, run_command, Cli, LogLevel};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(LogLevel::from_flags(cli.verbose, cli.quiet));

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
