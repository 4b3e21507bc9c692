//! Schedule command implementation

use super::load_recipe;
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{OutputFormat, ScheduleArgs};
use crate::model::Model;
use crate::modifier::{build_modifier, ScheduledModifierManager};
use crate::optim::{NoopOptimizer, ScheduledOptimizer};
use crate::recipe::Recipe;
use serde::Serialize;

/// One sampled epoch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleRow {
    pub epoch: f64,
    /// Target sparsity per pruning column, `None` before it starts
    pub sparsity: Vec<Option<f32>>,
    /// Learning rate, `None` until a learning rate modifier has run
    pub lr: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleTable {
    pub columns: Vec<String>,
    pub rows: Vec<ScheduleRow>,
}

/// Sample target sparsity and learning rate every `resolution` epochs
pub fn build_schedule(
    recipe: &Recipe,
    steps_per_epoch: usize,
    resolution: f64,
) -> Result<ScheduleTable, String> {
    if !(resolution > 0.0) {
        return Err(format!("Resolution must be positive, got {resolution}"));
    }
    let steps_per_epoch = steps_per_epoch.max(1);

    let pruning: Vec<_> = recipe
        .modifiers()
        .filter_map(|m| m.sparsity_schedule())
        .collect();
    let columns = recipe
        .modifiers()
        .filter(|m| m.sparsity_schedule().is_some())
        .enumerate()
        .map(|(i, m)| format!("{}#{i}", m.tag()))
        .collect();

    // LR modifiers never touch the model, so an empty one is enough to replay them
    let lr_modifiers: Vec<_> = recipe
        .modifiers()
        .filter(|m| m.is_learning_rate())
        .map(build_modifier)
        .collect();
    let has_lr = !lr_modifiers.is_empty();
    let mut model = Model::new("schedule");
    let manager = ScheduledModifierManager::from_modifiers(lr_modifiers);
    let mut optimizer =
        ScheduledOptimizer::new(NoopOptimizer::default(), manager, &mut model, steps_per_epoch)
            .map_err(|e| format!("Schedule error: {e}"))?;

    let max_epochs = recipe.max_epochs();
    let mut epochs = Vec::new();
    let mut k = 0u32;
    loop {
        let epoch = f64::from(k) * resolution;
        if epoch > max_epochs + 1e-9 {
            break;
        }
        epochs.push(epoch);
        k += 1;
    }
    if epochs.last().is_some_and(|last| (max_epochs - last).abs() > 1e-9) {
        epochs.push(max_epochs);
    }

    let mut rows = Vec::with_capacity(epochs.len());
    for epoch in epochs {
        let target = (epoch * steps_per_epoch as f64).round() as u64;
        while optimizer.global_step() <= target {
            optimizer
                .step(&mut model)
                .map_err(|e| format!("Schedule error: {e}"))?;
        }
        let lr_started = optimizer
            .manager()
            .modifiers()
            .iter()
            .any(|m| m.start_epoch() < 0.0 || m.start_epoch() <= epoch + 1e-9);
        let sparsity = pruning
            .iter()
            .map(|s| (epoch + 1e-9 >= s.start_epoch).then(|| s.sparsity_at_epoch(epoch)))
            .collect();
        rows.push(ScheduleRow {
            epoch,
            sparsity,
            lr: (has_lr && lr_started).then(|| optimizer.lr()),
        });
    }

    Ok(ScheduleTable { columns, rows })
}

/// Render the table as aligned text
pub fn format_schedule(table: &ScheduleTable) -> String {
    let mut header = format!("{:>8}", "epoch");
    for col in &table.columns {
        header.push_str(&format!("  {col:>28}"));
    }
    header.push_str(&format!("  {:>12}", "lr"));

    let mut lines = vec![header];
    for row in &table.rows {
        let mut line = format!("{:>8.3}", row.epoch);
        for s in &row.sparsity {
            match s {
                Some(v) => line.push_str(&format!("  {v:>28.4}")),
                None => line.push_str(&format!("  {:>28}", "-")),
            }
        }
        match row.lr {
            Some(lr) => line.push_str(&format!("  {lr:>12.6}")),
            None => line.push_str(&format!("  {:>12}", "-")),
        }
        lines.push(line);
    }
    lines.join("\n")
}

pub fn run_schedule(args: ScheduleArgs, level: LogLevel) -> Result<(), String> {
    let recipe = load_recipe(&args.recipe, &args.overrides)?;
    let table = build_schedule(&recipe, args.steps_per_epoch, args.resolution)?;

    match args.format {
        OutputFormat::Text => {
            log(
                level,
                LogLevel::Normal,
                &format!(
                    "Schedule for {} ({} steps per epoch):",
                    args.recipe.display(),
                    args.steps_per_epoch
                ),
            );
            println!("{}", format_schedule(&table));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&table)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&table)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
