//! Approximate pruning sensitivity from weight magnitudes
//!
//! For each prunable param the absolute values are sorted, and each sparsity
//! level reports the mean magnitude of the weights that stepping up from the
//! previous level would remove. Level `0.0` is the baseline with value `0.0`.
//! Params whose integral over the levels is large lose more magnitude when
//! pruned and are ranked as more sensitive.

use crate::model::Model;
use crate::{Error, Result};
use ndarray::ArrayD;
use serde::Serialize;

/// Levels checked when the caller supplies none.
pub const DEFAULT_SPARSITY_LEVELS: [f32; 11] =
    [0.0, 0.05, 0.2, 0.4, 0.6, 0.7, 0.8, 0.85, 0.9, 0.95, 0.99];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityResult {
    pub sparsity: f32,
    pub value: f32,
    pub baseline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamSensitivity {
    pub name: String,
    pub index: usize,
    pub results: Vec<SensitivityResult>,
}

impl ParamSensitivity {
    /// Trapezoid integral of value over sparsity.
    pub fn integral(&self) -> f32 {
        self.results
            .windows(2)
            .map(|w| (w[1].sparsity - w[0].sparsity) * (w[0].value + w[1].value) / 2.0)
            .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensitivityAnalysis {
    pub params: Vec<ParamSensitivity>,
}

impl SensitivityAnalysis {
    pub fn get(&self, name: &str) -> Option<&ParamSensitivity> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Params by descending integral; ties keep model order.
    pub fn ranked(&self) -> Vec<(&str, f32)> {
        let mut ranked: Vec<(&str, f32)> = self
            .params
            .iter()
            .map(|p| (p.name.as_str(), p.integral()))
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }
}

fn check_levels(levels: &[f32]) -> Result<()> {
    if levels.is_empty() {
        return Err(Error::InvalidParameter("no sparsity levels given".to_string()));
    }
    if let Some(bad) = levels.iter().find(|l| !(0.0..=1.0).contains(*l)) {
        return Err(Error::InvalidParameter(format!(
            "sparsity level {bad} must be between 0.0 and 1.0"
        )));
    }
    if levels.windows(2).any(|w| w[1] < w[0]) {
        return Err(Error::InvalidParameter(
            "sparsity levels must be ascending".to_string(),
        ));
    }
    Ok(())
}

/// Results for one tensor; `levels` must be ascending within `[0, 1]`.
pub fn param_sensitivity(values: &ArrayD<f32>, levels: &[f32]) -> Vec<SensitivityResult> {
    let mut sorted: Vec<f32> = values.iter().map(|v| v.abs()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    if sorted.is_empty() {
        return Vec::new();
    }

    let mut prev = 0usize;
    levels
        .iter()
        .map(|&sparsity| {
            let index = ((sparsity * sorted.len() as f32).round() as usize).min(sorted.len() - 1);
            let result = if sparsity <= 1e-9 {
                SensitivityResult {
                    sparsity: 0.0,
                    value: 0.0,
                    baseline: true,
                }
            } else {
                let value = if index > prev {
                    let removed = &sorted[prev..index];
                    removed.iter().sum::<f32>() / removed.len() as f32
                } else {
                    sorted[index]
                };
                SensitivityResult {
                    sparsity,
                    value,
                    baseline: false,
                }
            };
            prev = index + 1;
            result
        })
        .collect()
}

/// Analyse every prunable param of `model`.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] for empty, out-of-range or unordered
/// levels.
pub fn approx_ks_sensitivity(model: &Model, levels: &[f32]) -> Result<SensitivityAnalysis> {
    check_levels(levels)?;
    let params = model
        .prunable_param_names()
        .into_iter()
        .enumerate()
        .filter_map(|(index, name)| {
            let param = model.param(&name)?;
            if param.is_empty() {
                return None;
            }
            let results = param_sensitivity(&param.data, levels);
            tracing::debug!(param = %name, levels = results.len(), "sensitivity computed");
            Some(ParamSensitivity {
                name,
                index,
                results,
            })
        })
        .collect();
    Ok(SensitivityAnalysis { params })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Layer, LayerKind};
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, Array, IxDyn};

    fn ramp(n: usize, scale: f32) -> ArrayD<f32> {
        Array::from_shape_vec(IxDyn(&[n]), (1..=n).map(|v| v as f32 * scale).collect()).unwrap()
    }

    #[test]
    fn test_param_sensitivity_steps() {
        // TEST_ID: SENS-001
        let results = param_sensitivity(&ramp(10, 1.0), &[0.0, 0.2, 0.5, 1.0]);
        let values: Vec<f32> = results.iter().map(|r| r.value).collect();
        assert_eq!(values, vec![0.0, 2.0, 4.5, 8.0]);
        assert!(results[0].baseline);
        assert!(!results[3].baseline);
    }

    #[test]
    fn test_uses_absolute_values() {
        // TEST_ID: SENS-002
        let w = arr1(&[-4.0f32, 1.0, -2.0, 3.0]).into_dyn();
        let results = param_sensitivity(&w, &[0.0, 0.75]);
        // sorted |w| = [1, 2, 3, 4]; prev = 1 after baseline, index 3
        assert_abs_diff_eq!(results[1].value, 2.5);
    }

    #[test]
    fn test_empty_slice_uses_value_at_index() {
        // TEST_ID: SENS-003
        let results = param_sensitivity(&ramp(4, 1.0), &[0.25, 0.3]);
        // 0.25 -> index 1, mean(sorted[0..1]) = 1; 0.3 -> index 1 <= prev 2
        assert_eq!(results[0].value, 1.0);
        assert_eq!(results[1].value, 2.0);
    }

    #[test]
    fn test_integral_trapezoid() {
        // TEST_ID: SENS-004
        let p = ParamSensitivity {
            name: "w".to_string(),
            index: 0,
            results: param_sensitivity(&ramp(10, 1.0), &[0.0, 0.2, 0.5, 1.0]),
        };
        assert_abs_diff_eq!(p.integral(), 4.3, epsilon = 1e-5);
    }

    #[test]
    fn test_model_analysis_ranks_large_weights_first() {
        // TEST_ID: SENS-005
        let model = Model::new("m")
            .with_layer(Layer::linear("small", ramp(10, 0.1), Some(ramp(10, 100.0))))
            .with_layer(Layer::linear("large", ramp(10, 10.0), None))
            .with_layer(Layer::new("ln", LayerKind::Norm).with_param("weight", ramp(10, 50.0)));
        let analysis = approx_ks_sensitivity(&model, &DEFAULT_SPARSITY_LEVELS).unwrap();
        assert_eq!(analysis.params.len(), 2, "SENS-005 FALSIFIED: only prunable weights");
        let ranked = analysis.ranked();
        assert_eq!(ranked[0].0, "large.weight");
        assert_eq!(ranked[1].0, "small.weight");
        assert_eq!(analysis.get("large.weight").unwrap().index, 1);
    }

    #[test]
    fn test_invalid_levels() {
        // TEST_ID: SENS-006
        let model = Model::new("m");
        assert!(approx_ks_sensitivity(&model, &[]).is_err());
        assert!(approx_ks_sensitivity(&model, &[0.0, 1.5]).is_err());
        assert!(approx_ks_sensitivity(&model, &[0.5, 0.2]).is_err());
    }
}
