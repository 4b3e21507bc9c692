//! Apply command implementation

use super::load_recipe;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::ApplyArgs;
use crate::model::{load_model, save_model, Model};
use crate::optim::apply_recipe;

/// Per-param sparsity lines for every param with zeros
pub fn format_sparsity_report(model: &Model) -> String {
    let mut lines = Vec::new();
    for param in model.params().filter(|p| p.num_zeros() > 0) {
        lines.push(format!("  {:<40} {:>6.2}%", param.name, param.sparsity() * 100.0));
    }
    let prunable = model.prunable_param_names();
    lines.push(format!(
        "  Overall prunable sparsity: {:.2}%",
        model.sparsity_of(&prunable) * 100.0
    ));
    lines.join("\n")
}

pub fn run_apply(args: ApplyArgs, level: LogLevel) -> Result<(), String> {
    let recipe = load_recipe(&args.recipe, &args.overrides)?;
    let mut model = load_model(&args.model).map_err(|e| format!("Model error: {e}"))?;

    log(
        level,
        LogLevel::Normal,
        &format!(
            "Applying {} modifiers over {} epochs to {}",
            recipe.num_modifiers(),
            recipe.max_epochs(),
            args.model.display()
        ),
    );

    let optimizer = apply_recipe(&recipe, &mut model, args.steps_per_epoch)
        .map_err(|e| format!("Apply error: {e}"))?;

    for modifier in optimizer.manager().modifiers() {
        if let Some(sparsity) = modifier.applied_sparsity() {
            log(
                level,
                LogLevel::Verbose,
                &format!("  {}: sparsity {sparsity:.4}", modifier.name()),
            );
        }
    }

    save_model(&model, &args.output).map_err(|e| format!("Save error: {e}"))?;

    log(level, LogLevel::Normal, &format_sparsity_report(&model));
    log(
        level,
        LogLevel::Normal,
        &format!("Pruned model written to {}", args.output.display()),
    );
    Ok(())
}
