//! The modifier lifecycle

use super::ModifierContext;
use crate::model::Model;
use crate::optim::Optimizer;
use crate::Result;
use ndarray::ArrayD;
use std::collections::BTreeMap;
use std::fmt;

/// Mask and buffer state keyed by `<param>.<buffer>`.
pub type StateDict = BTreeMap<String, ArrayD<f32>>;

/// A schedule-driven rule applied to a model during training.
///
/// The caller initializes every modifier once, then on each step checks
/// [`Modifier::update_ready`] and runs [`Modifier::scheduled_update`] before the
/// optimizer step, followed by [`Modifier::optimizer_post_step`] after it.
pub trait Modifier: Send + fmt::Debug {
    /// Recipe tag of this modifier, e.g. `GMPruningModifier`.
    fn name(&self) -> &str;

    fn start_epoch(&self) -> f64;

    fn end_epoch(&self) -> f64;

    /// Resolve selectors against `model` and set up masks.
    fn initialize(&mut self, model: &mut Model, ctx: &ModifierContext) -> Result<()>;

    fn update_ready(&self, ctx: &ModifierContext) -> bool;

    fn scheduled_update(
        &mut self,
        model: &mut Model,
        optimizer: &mut dyn Optimizer,
        ctx: &ModifierContext,
    ) -> Result<()>;

    /// Called after every optimizer step.
    fn optimizer_post_step(&mut self, _model: &mut Model, _ctx: &ModifierContext) -> Result<()> {
        Ok(())
    }

    /// Called once when training is over.
    fn finalize(&mut self, _model: &mut Model) -> Result<()> {
        Ok(())
    }

    /// Sparsity currently applied, for pruning modifiers that have started.
    fn applied_sparsity(&self) -> Option<f32> {
        None
    }

    fn state_dict(&self) -> StateDict {
        StateDict::new()
    }

    /// Restore masks from `state` and apply them to `model`.
    ///
    /// Keys that do not belong to this modifier are ignored.
    fn load_state_dict(&mut self, _model: &mut Model, _state: &StateDict) -> Result<()> {
        Ok(())
    }
}

/// State dict key for the mask of `param`.
pub fn mask_key(param: &str) -> String {
    format!("{param}.sparsity_mask")
}
