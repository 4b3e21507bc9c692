//! Sensitivity command implementation

use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::{OutputFormat, SensitivityArgs};
use crate::model::load_model;
use crate::sensitivity::{approx_ks_sensitivity, SensitivityAnalysis, DEFAULT_SPARSITY_LEVELS};

/// Ranking table, most sensitive first
pub fn format_ranking(analysis: &SensitivityAnalysis) -> String {
    let mut lines = vec![format!("  {:>4}  {:<40} {:>12}", "rank", "param", "integral")];
    for (rank, (name, integral)) in analysis.ranked().into_iter().enumerate() {
        lines.push(format!("  {:>4}  {name:<40} {integral:>12.6}", rank + 1));
    }
    lines.join("\n")
}

pub fn run_sensitivity(args: SensitivityArgs, level: LogLevel) -> Result<(), String> {
    let model = load_model(&args.model).map_err(|e| format!("Model error: {e}"))?;
    let levels = if args.levels.is_empty() {
        DEFAULT_SPARSITY_LEVELS.to_vec()
    } else {
        args.levels
    };
    let analysis =
        approx_ks_sensitivity(&model, &levels).map_err(|e| format!("Sensitivity error: {e}"))?;

    match args.format {
        OutputFormat::Text => {
            log(
                level,
                LogLevel::Normal,
                &format!(
                    "Approximate sensitivity of {} prunable params:",
                    analysis.params.len()
                ),
            );
            println!("{}", format_ranking(&analysis));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&analysis)
                .map_err(|e| format!("JSON serialization error: {e}"))?;
            println!("{json}");
        }
        OutputFormat::Yaml => {
            let yaml = serde_yaml::to_string(&analysis)
                .map_err(|e| format!("YAML serialization error: {e}"))?;
            println!("{yaml}");
        }
    }

    Ok(())
}
