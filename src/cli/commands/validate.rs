//! Validate command implementation

use super::{format_modifier, load_recipe};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::ValidateArgs;
use crate::recipe::Recipe;

/// Format variable values as a string
pub fn format_variables(recipe: &Recipe) -> String {
    if recipe.variables().is_empty() {
        return "  Variables: none".to_string();
    }
    let mut lines = vec!["  Variables:".to_string()];
    for (name, value) in recipe.variables().iter() {
        let rendered = serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_else(|_| format!("{value:?}"));
        lines.push(format!("    {name} = {rendered}"));
    }
    lines.join("\n")
}

/// Format each stage and its modifiers as a string
pub fn format_stages(recipe: &Recipe) -> String {
    let mut lines = Vec::new();
    for stage in recipe.stages() {
        lines.push(format!("  Stage {} ({} modifiers):", stage.name, stage.modifiers.len()));
        for spec in &stage.modifiers {
            lines.push(format!("    - {}", format_modifier(spec)));
        }
    }
    lines.join("\n")
}

/// Print detailed recipe summary
pub fn print_detailed_summary(recipe: &Recipe) {
    println!();
    println!("Recipe Summary:");
    println!("{}", format_variables(recipe));
    println!();
    println!("{}", format_stages(recipe));
    println!();
    println!("  Max epochs: {}", recipe.max_epochs());
}

pub fn run_validate(args: ValidateArgs, level: LogLevel) -> Result<(), String> {
    log(
        level,
        LogLevel::Normal,
        &format!("Validating recipe: {}", args.recipe.display()),
    );

    let recipe = load_recipe(&args.recipe, &args.overrides)?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Recipe is valid: {} modifiers in {} stages",
            recipe.num_modifiers(),
            recipe.stages().len()
        ),
    );

    if args.detailed {
        print_detailed_summary(&recipe);
    }

    Ok(())
}
