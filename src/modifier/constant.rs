//! Constant-sparsity pruning
//!
//! Holds whatever sparsity pattern the selected params have at start, so
//! fine-tuning a pruned model keeps its zeros.

use super::traits::{mask_key, StateDict};
use super::{Cadence, Modifier, ModifierContext, ScheduleTracker};
use crate::model::Model;
use crate::optim::Optimizer;
use crate::prune::{apply_mask, nonzero_mask};
use crate::recipe::ConstantPruningSpec;
use crate::{Error, Result};
use ndarray::ArrayD;

#[derive(Debug, Clone)]
pub struct ConstantPruningModifier {
    spec: ConstantPruningSpec,
    tracker: ScheduleTracker,
    params: Vec<String>,
    masks: Vec<ArrayD<f32>>,
    initialized: bool,
}

impl ConstantPruningModifier {
    pub fn new(spec: ConstantPruningSpec) -> Self {
        let tracker = ScheduleTracker::new(
            spec.start_epoch,
            spec.end_epoch,
            Cadence::from_frequency_or_every_step(spec.update_frequency),
        );
        Self {
            spec,
            tracker,
            params: Vec::new(),
            masks: Vec::new(),
            initialized: false,
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn mask(&self, param: &str) -> Option<&ArrayD<f32>> {
        self.params
            .iter()
            .position(|p| p == param)
            .map(|i| &self.masks[i])
    }

    fn apply_masks(&self, model: &mut Model) -> Result<()> {
        for (name, mask) in self.params.iter().zip(&self.masks) {
            let param = model.require_param_mut(name)?;
            apply_mask(name, &mut param.data, param.grad.as_mut(), mask)?;
        }
        Ok(())
    }
}

impl Modifier for ConstantPruningModifier {
    fn name(&self) -> &str {
        "ConstantPruningModifier"
    }

    fn start_epoch(&self) -> f64 {
        self.spec.start_epoch
    }

    fn end_epoch(&self) -> f64 {
        self.spec.end_epoch
    }

    fn initialize(&mut self, model: &mut Model, _ctx: &ModifierContext) -> Result<()> {
        self.params = self
            .spec
            .params
            .resolve(&model.param_names(), &model.prunable_param_names())?;
        self.initialized = true;
        Ok(())
    }

    fn update_ready(&self, ctx: &ModifierContext) -> bool {
        self.initialized && self.tracker.update_ready(ctx)
    }

    fn scheduled_update(
        &mut self,
        model: &mut Model,
        _optimizer: &mut dyn Optimizer,
        ctx: &ModifierContext,
    ) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized(self.name().to_string()));
        }
        let t = self.tracker.mark_update(ctx);
        if t.started {
            self.masks = self
                .params
                .iter()
                .map(|name| {
                    model
                        .param(name)
                        .map(|p| nonzero_mask(&p.data))
                        .ok_or_else(|| Error::UnknownParameter(name.clone()))
                })
                .collect::<Result<_>>()?;
            tracing::info!(
                epoch = ctx.epoch,
                sparsity = model.sparsity_of(&self.params),
                "constant pruning started"
            );
        } else if !t.ended {
            self.apply_masks(model)?;
        }
        if t.ended {
            tracing::info!(epoch = ctx.epoch, "constant pruning ended");
        }
        Ok(())
    }

    fn optimizer_post_step(&mut self, model: &mut Model, _ctx: &ModifierContext) -> Result<()> {
        if self.tracker.is_active() {
            self.apply_masks(model)?;
        }
        Ok(())
    }

    fn finalize(&mut self, _model: &mut Model) -> Result<()> {
        self.tracker.force_end();
        Ok(())
    }

    fn applied_sparsity(&self) -> Option<f32> {
        if !self.tracker.has_started() || self.masks.is_empty() {
            return None;
        }
        let (zeros, total) = self.masks.iter().fold((0usize, 0usize), |(z, n), m| {
            (z + m.iter().filter(|v| **v == 0.0).count(), n + m.len())
        });
        Some(if total == 0 { 0.0 } else { zeros as f32 / total as f32 })
    }

    fn state_dict(&self) -> StateDict {
        self.params
            .iter()
            .zip(&self.masks)
            .map(|(name, mask)| (mask_key(name), mask.clone()))
            .collect()
    }

    fn load_state_dict(&mut self, model: &mut Model, state: &StateDict) -> Result<()> {
        if !self.initialized {
            return Err(Error::NotInitialized(self.name().to_string()));
        }
        let restored = self
            .params
            .iter()
            .map(|name| state.get(&mask_key(name)).cloned())
            .collect::<Option<Vec<_>>>();
        if let Some(masks) = restored {
            self.masks = masks;
            self.apply_masks(model)?;
        }
        Ok(())
    }
}
