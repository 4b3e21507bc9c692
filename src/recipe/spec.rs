//! Typed modifier records
//!
//! Each recipe entry is a YAML-tagged mapping such as
//!
//! ```yaml
//! - !GMPruningModifier
//!   params: __ALL_PRUNABLE__
//!   init_sparsity: 0.05
//!   final_sparsity: 0.8
//!   start_epoch: 0.0
//!   end_epoch: 30.0
//!   update_frequency: 1.0
//! ```
//!
//! The set of tags is closed; each maps to a struct with its own schema and
//! unknown fields are rejected. Epoch fields of `-1.0` on the constant, layer
//! and learning-rate modifiers mean "unbounded" (see `DESIGN.md`).

use crate::prune::{InterpolationFunc, MaskType, ParamSelector, SparsitySchedule};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Every tag the parser accepts.
pub const MODIFIER_TAGS: &[&str] = &[
    "EpochRangeModifier",
    "SetLearningRateModifier",
    "LearningRateFunctionModifier",
    "LearningRateModifier",
    "GMPruningModifier",
    "MagnitudePruningModifier",
    "GlobalMagnitudePruningModifier",
    "MovementPruningModifier",
    "ConstantPruningModifier",
    "LayerPruningModifier",
];

fn unbounded() -> f64 {
    -1.0
}

fn default_true() -> bool {
    true
}

fn default_gamma() -> f64 {
    0.1
}

/// A modifier record from a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModifierSpec {
    #[serde(rename = "EpochRangeModifier")]
    EpochRange(EpochRangeSpec),
    #[serde(rename = "SetLearningRateModifier")]
    SetLearningRate(SetLearningRateSpec),
    #[serde(rename = "LearningRateFunctionModifier")]
    LearningRateFunction(LearningRateFunctionSpec),
    #[serde(rename = "LearningRateModifier")]
    LearningRate(LearningRateSpec),
    #[serde(rename = "GMPruningModifier")]
    GmPruning(MagnitudePruningSpec),
    #[serde(rename = "MagnitudePruningModifier")]
    MagnitudePruning(MagnitudePruningSpec),
    #[serde(rename = "GlobalMagnitudePruningModifier")]
    GlobalMagnitudePruning(MagnitudePruningSpec),
    #[serde(rename = "MovementPruningModifier")]
    MovementPruning(MovementPruningSpec),
    #[serde(rename = "ConstantPruningModifier")]
    ConstantPruning(ConstantPruningSpec),
    #[serde(rename = "LayerPruningModifier")]
    LayerPruning(LayerPruningSpec),
}

/// Declares the overall epoch range of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EpochRangeSpec {
    pub start_epoch: f64,
    pub end_epoch: f64,
}

/// Sets the learning rate once at `start_epoch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetLearningRateSpec {
    pub learning_rate: f32,
    #[serde(default)]
    pub start_epoch: f64,
    #[serde(default = "unbounded")]
    pub end_epoch: f64,
}

/// Continuous learning-rate curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LrFunc {
    Linear,
    Cosine,
}

impl fmt::Display for LrFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LrFunc::Linear => write!(f, "linear"),
            LrFunc::Cosine => write!(f, "cosine"),
        }
    }
}

/// Interpolates the learning rate from `init_lr` to `final_lr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LearningRateFunctionSpec {
    pub lr_func: LrFunc,
    pub init_lr: f32,
    pub final_lr: f32,
    pub start_epoch: f64,
    pub end_epoch: f64,
    #[serde(default = "unbounded")]
    pub update_frequency: f64,
}

/// Step-wise learning-rate schedule family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LrClass {
    #[serde(rename = "StepLR")]
    Step,
    #[serde(rename = "MultiStepLR")]
    MultiStep,
    #[serde(rename = "ExponentialLR")]
    Exponential,
}

impl fmt::Display for LrClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LrClass::Step => write!(f, "StepLR"),
            LrClass::MultiStep => write!(f, "MultiStepLR"),
            LrClass::Exponential => write!(f, "ExponentialLR"),
        }
    }
}

/// Arguments for [`LrClass`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LrKwargs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub milestones: Option<Vec<f64>>,
    #[serde(default = "default_gamma")]
    pub gamma: f64,
}

/// Step-wise learning-rate decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LearningRateSpec {
    pub lr_class: LrClass,
    pub lr_kwargs: LrKwargs,
    pub init_lr: f32,
    pub start_epoch: f64,
    #[serde(default = "unbounded")]
    pub end_epoch: f64,
    #[serde(default = "unbounded")]
    pub update_frequency: f64,
}

/// Gradual magnitude pruning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MagnitudePruningSpec {
    pub params: ParamSelector,
    pub init_sparsity: f32,
    pub final_sparsity: f32,
    pub start_epoch: f64,
    pub end_epoch: f64,
    pub update_frequency: f64,
    #[serde(default)]
    pub inter_func: InterpolationFunc,
    #[serde(default)]
    pub mask_type: MaskType,
    #[serde(default = "default_true")]
    pub leave_enabled: bool,
    #[serde(default)]
    pub global_sparsity: bool,
    #[serde(default)]
    pub phased: bool,
}

impl MagnitudePruningSpec {
    /// The sparsity ramp described by this record.
    pub fn schedule(&self) -> SparsitySchedule {
        SparsitySchedule {
            init_sparsity: self.init_sparsity,
            final_sparsity: self.final_sparsity,
            start_epoch: self.start_epoch,
            end_epoch: self.end_epoch,
            inter_func: self.inter_func,
        }
    }
}

/// Gradual pruning ranked by accumulated movement scores (`-w * grad`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovementPruningSpec {
    pub params: ParamSelector,
    pub init_sparsity: f32,
    pub final_sparsity: f32,
    pub start_epoch: f64,
    pub end_epoch: f64,
    pub update_frequency: f64,
    #[serde(default)]
    pub inter_func: InterpolationFunc,
    #[serde(default)]
    pub mask_type: MaskType,
    #[serde(default = "default_true")]
    pub leave_enabled: bool,
}

impl MovementPruningSpec {
    pub fn schedule(&self) -> SparsitySchedule {
        SparsitySchedule {
            init_sparsity: self.init_sparsity,
            final_sparsity: self.final_sparsity,
            start_epoch: self.start_epoch,
            end_epoch: self.end_epoch,
            inter_func: self.inter_func,
        }
    }
}

/// Holds the current sparsity pattern of the selected params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConstantPruningSpec {
    pub params: ParamSelector,
    #[serde(default = "unbounded")]
    pub start_epoch: f64,
    #[serde(default = "unbounded")]
    pub end_epoch: f64,
    #[serde(default = "unbounded")]
    pub update_frequency: f64,
}

/// Bypasses whole layers for a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayerPruningSpec {
    pub layers: ParamSelector,
    #[serde(default = "unbounded")]
    pub start_epoch: f64,
    #[serde(default = "unbounded")]
    pub end_epoch: f64,
    /// Accepted for recipe compatibility; the bypass is held every step.
    #[serde(default = "unbounded")]
    pub update_frequency: f64,
}

/// Start/end epochs where `-1.0` stands for "unbounded".
fn check_sentinel_window(start: f64, end: f64) -> Result<(), String> {
    for (field, v) in [("start_epoch", start), ("end_epoch", end)] {
        if v < 0.0 && v != -1.0 {
            return Err(format!("{field} ({v}) must be non-negative or -1"));
        }
    }
    if start >= 0.0 && end >= 0.0 && end < start {
        return Err(format!(
            "end_epoch ({end}) must not be before start_epoch ({start})"
        ));
    }
    Ok(())
}

fn check_selector(field: &str, selector: &ParamSelector) -> Result<(), String> {
    if selector.is_empty() {
        return Err(format!("{field} must name at least one entry"));
    }
    selector.validate().map_err(|e| e.to_string())
}

fn check_lr(field: &str, lr: f32) -> Result<(), String> {
    if lr.is_finite() && lr > 0.0 {
        Ok(())
    } else {
        Err(format!("{field} ({lr}) must be > 0.0"))
    }
}

impl ModifierSpec {
    /// Recipe tag, without the leading `!`.
    pub fn tag(&self) -> &'static str {
        match self {
            ModifierSpec::EpochRange(_) => "EpochRangeModifier",
            ModifierSpec::SetLearningRate(_) => "SetLearningRateModifier",
            ModifierSpec::LearningRateFunction(_) => "LearningRateFunctionModifier",
            ModifierSpec::LearningRate(_) => "LearningRateModifier",
            ModifierSpec::GmPruning(_) => "GMPruningModifier",
            ModifierSpec::MagnitudePruning(_) => "MagnitudePruningModifier",
            ModifierSpec::GlobalMagnitudePruning(_) => "GlobalMagnitudePruningModifier",
            ModifierSpec::MovementPruning(_) => "MovementPruningModifier",
            ModifierSpec::ConstantPruning(_) => "ConstantPruningModifier",
            ModifierSpec::LayerPruning(_) => "LayerPruningModifier",
        }
    }

    pub fn start_epoch(&self) -> f64 {
        match self {
            ModifierSpec::EpochRange(s) => s.start_epoch,
            ModifierSpec::SetLearningRate(s) => s.start_epoch,
            ModifierSpec::LearningRateFunction(s) => s.start_epoch,
            ModifierSpec::LearningRate(s) => s.start_epoch,
            ModifierSpec::GmPruning(s)
            | ModifierSpec::MagnitudePruning(s)
            | ModifierSpec::GlobalMagnitudePruning(s) => s.start_epoch,
            ModifierSpec::MovementPruning(s) => s.start_epoch,
            ModifierSpec::ConstantPruning(s) => s.start_epoch,
            ModifierSpec::LayerPruning(s) => s.start_epoch,
        }
    }

    pub fn end_epoch(&self) -> f64 {
        match self {
            ModifierSpec::EpochRange(s) => s.end_epoch,
            ModifierSpec::SetLearningRate(s) => s.end_epoch,
            ModifierSpec::LearningRateFunction(s) => s.end_epoch,
            ModifierSpec::LearningRate(s) => s.end_epoch,
            ModifierSpec::GmPruning(s)
            | ModifierSpec::MagnitudePruning(s)
            | ModifierSpec::GlobalMagnitudePruning(s) => s.end_epoch,
            ModifierSpec::MovementPruning(s) => s.end_epoch,
            ModifierSpec::ConstantPruning(s) => s.end_epoch,
            ModifierSpec::LayerPruning(s) => s.end_epoch,
        }
    }

    /// `update_frequency`, for the modifiers that have one.
    pub fn update_frequency(&self) -> Option<f64> {
        match self {
            ModifierSpec::EpochRange(_) | ModifierSpec::SetLearningRate(_) => None,
            ModifierSpec::LearningRateFunction(s) => Some(s.update_frequency),
            ModifierSpec::LearningRate(s) => Some(s.update_frequency),
            ModifierSpec::GmPruning(s)
            | ModifierSpec::MagnitudePruning(s)
            | ModifierSpec::GlobalMagnitudePruning(s) => Some(s.update_frequency),
            ModifierSpec::MovementPruning(s) => Some(s.update_frequency),
            ModifierSpec::ConstantPruning(s) => Some(s.update_frequency),
            ModifierSpec::LayerPruning(s) => Some(s.update_frequency),
        }
    }

    pub fn is_pruning(&self) -> bool {
        matches!(
            self,
            ModifierSpec::GmPruning(_)
                | ModifierSpec::MagnitudePruning(_)
                | ModifierSpec::GlobalMagnitudePruning(_)
                | ModifierSpec::MovementPruning(_)
                | ModifierSpec::ConstantPruning(_)
                | ModifierSpec::LayerPruning(_)
        )
    }

    pub fn is_learning_rate(&self) -> bool {
        matches!(
            self,
            ModifierSpec::SetLearningRate(_)
                | ModifierSpec::LearningRateFunction(_)
                | ModifierSpec::LearningRate(_)
        )
    }

    /// Magnitude pruning fields, for the three magnitude variants.
    pub fn magnitude(&self) -> Option<&MagnitudePruningSpec> {
        match self {
            ModifierSpec::GmPruning(s)
            | ModifierSpec::MagnitudePruning(s)
            | ModifierSpec::GlobalMagnitudePruning(s) => Some(s),
            _ => None,
        }
    }

    /// Sparsity ramp of the gradual pruning variants.
    pub fn sparsity_schedule(&self) -> Option<SparsitySchedule> {
        match self {
            ModifierSpec::MovementPruning(s) => Some(s.schedule()),
            other => other.magnitude().map(MagnitudePruningSpec::schedule),
        }
    }

    /// Range checks that the schema alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ModifierSpec::EpochRange(s) => {
                if s.start_epoch < 0.0 {
                    return Err(format!("start_epoch ({}) must be non-negative", s.start_epoch));
                }
                if s.end_epoch < s.start_epoch {
                    return Err(format!(
                        "end_epoch ({}) must not be before start_epoch ({})",
                        s.end_epoch, s.start_epoch
                    ));
                }
                Ok(())
            }
            ModifierSpec::SetLearningRate(s) => {
                check_lr("learning_rate", s.learning_rate)?;
                if s.start_epoch < 0.0 {
                    return Err(format!("start_epoch ({}) must be non-negative", s.start_epoch));
                }
                check_sentinel_window(s.start_epoch, s.end_epoch)
            }
            ModifierSpec::LearningRateFunction(s) => {
                check_lr("init_lr", s.init_lr)?;
                if !(s.final_lr >= 0.0) {
                    return Err(format!("final_lr ({}) must be >= 0.0", s.final_lr));
                }
                if s.start_epoch < 0.0 || s.end_epoch <= s.start_epoch {
                    return Err(format!(
                        "epoch range [{}, {}] must be non-negative and non-empty",
                        s.start_epoch, s.end_epoch
                    ));
                }
                Ok(())
            }
            ModifierSpec::LearningRate(s) => {
                check_lr("init_lr", s.init_lr)?;
                if s.start_epoch < 0.0 {
                    return Err(format!("start_epoch ({}) must be non-negative", s.start_epoch));
                }
                check_sentinel_window(s.start_epoch, s.end_epoch)?;
                if !(s.lr_kwargs.gamma > 0.0) {
                    return Err(format!("lr_kwargs.gamma ({}) must be > 0.0", s.lr_kwargs.gamma));
                }
                match s.lr_class {
                    LrClass::Step => match s.lr_kwargs.step_size {
                        Some(size) if size > 0.0 => Ok(()),
                        _ => Err("StepLR requires lr_kwargs.step_size > 0".to_string()),
                    },
                    LrClass::MultiStep => match s.lr_kwargs.milestones.as_deref() {
                        Some(m) if !m.is_empty() && m.windows(2).all(|w| w[0] <= w[1]) => Ok(()),
                        _ => Err(
                            "MultiStepLR requires non-empty ascending lr_kwargs.milestones"
                                .to_string(),
                        ),
                    },
                    LrClass::Exponential => Ok(()),
                }
            }
            ModifierSpec::GmPruning(s)
            | ModifierSpec::MagnitudePruning(s)
            | ModifierSpec::GlobalMagnitudePruning(s) => {
                check_selector("params", &s.params)?;
                s.schedule().validate()
            }
            ModifierSpec::MovementPruning(s) => {
                check_selector("params", &s.params)?;
                s.schedule().validate()
            }
            ModifierSpec::ConstantPruning(s) => {
                check_selector("params", &s.params)?;
                check_sentinel_window(s.start_epoch, s.end_epoch)
            }
            ModifierSpec::LayerPruning(s) => {
                check_selector("layers", &s.layers)?;
                check_sentinel_window(s.start_epoch, s.end_epoch)
            }
        }
    }
}
