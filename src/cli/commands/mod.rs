//! CLI command implementations

mod apply;
mod info;
mod schedule;
mod sensitivity;
mod validate;


use crate::cli::LogLevel;
use crate::config::{parse_overrides, Cli, Command};
use crate::recipe::{ModifierSpec, Recipe};
use std::path::Path;

/// Execute a CLI command based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<(), String> {
    // Configure output based on verbose/quiet flags
    let log_level = LogLevel::from_flags(cli.verbose, cli.quiet);

    match cli.command {
        Command::Validate(args) => validate::run_validate(args, log_level),
        Command::Info(args) => info::run_info(args, log_level),
        Command::Schedule(args) => schedule::run_schedule(args, log_level),
        Command::Apply(args) => apply::run_apply(args, log_level),
        Command::Sensitivity(args) => sensitivity::run_sensitivity(args, log_level),
    }
}

/// Load a recipe applying `--set` overrides
pub(crate) fn load_recipe(path: &Path, overrides: &[String]) -> Result<Recipe, String> {
    let overrides = parse_overrides(overrides).map_err(|e| format!("Override error: {e}"))?;
    Recipe::load_with_overrides(path, &overrides).map_err(|e| format!("Recipe error: {e}"))
}

fn format_epoch(epoch: f64) -> String {
    if epoch < 0.0 {
        "-".to_string()
    } else {
        format!("{epoch}")
    }
}

/// One-line description of a modifier record
pub(crate) fn format_modifier(spec: &ModifierSpec) -> String {
    let window = format!(
        "epochs {}..{}",
        format_epoch(spec.start_epoch()),
        format_epoch(spec.end_epoch())
    );
    let detail = match spec {
        ModifierSpec::EpochRange(_) => String::new(),
        ModifierSpec::SetLearningRate(s) => format!("lr={}", s.learning_rate),
        ModifierSpec::LearningRateFunction(s) => {
            format!("{} lr {} -> {}", s.lr_func, s.init_lr, s.final_lr)
        }
        ModifierSpec::LearningRate(s) => {
            format!("{} init_lr={} gamma={}", s.lr_class, s.init_lr, s.lr_kwargs.gamma)
        }
        ModifierSpec::GmPruning(s)
        | ModifierSpec::MagnitudePruning(s)
        | ModifierSpec::GlobalMagnitudePruning(s) => format!(
            "sparsity {} -> {} ({}, {}, every {} epochs) params: {}",
            s.init_sparsity,
            s.final_sparsity,
            s.inter_func,
            s.mask_type,
            s.update_frequency,
            s.params.patterns().join(", ")
        ),
        ModifierSpec::MovementPruning(s) => format!(
            "sparsity {} -> {} ({}, {}, every {} epochs) params: {}",
            s.init_sparsity,
            s.final_sparsity,
            s.inter_func,
            s.mask_type,
            s.update_frequency,
            s.params.patterns().join(", ")
        ),
        ModifierSpec::ConstantPruning(s) => format!("params: {}", s.params.patterns().join(", ")),
        ModifierSpec::LayerPruning(s) => format!("layers: {}", s.layers.patterns().join(", ")),
    };
    if detail.is_empty() {
        format!("{} [{window}]", spec.tag())
    } else {
        format!("{} [{window}] {detail}", spec.tag())
    }
}
