//! Info command implementation

use super::load_recipe;
use super::validate::{format_stages, format_variables};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{InfoArgs, OutputFormat};

pub fn run_info(args: InfoArgs, level: LogLevel) -> Result<(), String> {
    let recipe = load_recipe(&args.recipe, &args.overrides)?;

    match args.format {
        OutputFormat::Text => {
            log(level, LogLevel::Normal, "Recipe Info:");
            println!();
            println!("Recipe: {}", args.recipe.display());
            println!("Stages: {}", recipe.stages().len());
            println!("Modifiers: {}", recipe.num_modifiers());
            println!("Max epochs: {}", recipe.max_epochs());
            if recipe.modifiers().any(|m| m.is_pruning()) {
                println!("Pruning: enabled");
            }
            if recipe.modifiers().any(|m| m.is_learning_rate()) {
                println!("Learning rate schedule: enabled");
            }
            println!();
            println!("{}", format_variables(&recipe));
            println!("{}", format_stages(&recipe));
            log(
                level,
                LogLevel::Verbose,
                &format!("\nProse ({} bytes):\n{}", recipe.prose().len(), recipe.prose()),
            );
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&recipe.summary())
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = recipe
                .to_yaml()
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
