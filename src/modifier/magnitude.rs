//! Gradual magnitude pruning
//!
//! Between `start_epoch` and `end_epoch` the target sparsity follows the
//! interpolation curve from `init_sparsity` to `final_sparsity`. At every
//! scheduled update the lowest-magnitude weights (or groups, for structured
//! mask types) of the selected params are masked to zero, and the masks are
//! re-applied after each optimizer step so pruned weights stay at zero.

use super::traits::{mask_key, StateDict};
use super::{Cadence, Modifier, ModifierContext, Phase, ScheduleTracker};
use crate::model::Model;
use crate::optim::Optimizer;
use crate::prune::{apply_mask, global_magnitude_masks, magnitude_mask, SparsitySchedule};
use crate::recipe::MagnitudePruningSpec;
use crate::{Error, Result};
use ndarray::ArrayD;

#[derive(Debug, Clone)]
pub struct MagnitudePruningModifier {
    name: &'static str,
    spec: MagnitudePruningSpec,
    global: bool,
    tracker: ScheduleTracker,
    params: Vec<String>,
    masks: Vec<ArrayD<f32>>,
    masks_enabled: bool,
    applied_sparsity: Option<f32>,
    num_updates: usize,
    initialized: bool,
}

impl MagnitudePruningModifier {
    /// `global` forces one threshold across params regardless of
    /// `spec.global_sparsity`.
    pub fn new(name: &'static str, spec: MagnitudePruningSpec, global: bool) -> Self {
        let tracker = ScheduleTracker::new(
            spec.start_epoch,
            spec.end_epoch,
            Cadence::from_frequency(spec.update_frequency),
        );
        let global = global || spec.global_sparsity;
        Self {
            name,
            spec,
            global,
            tracker,
            params: Vec::new(),
            masks: Vec::new(),
            masks_enabled: false,
            applied_sparsity: None,
            num_updates: 0,
            initialized: false,
        }
    }

    pub fn schedule(&self) -> SparsitySchedule {
        self.spec.schedule()
    }

    /// Params selected at initialization.
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn is_global(&self) -> bool {
        self.global
    }

    pub fn mask(&self, param: &str) -> Option<&ArrayD<f32>> {
        self.params
            .iter()
            .position(|p| p == param)
            .map(|i| &self.masks[i])
    }

    pub fn phase(&self) -> Phase {
        self.tracker.phase()
    }

    /// Sparsity an update at `ctx` would apply.
    fn target_sparsity(&self, ctx: &ModifierContext, ending: bool) -> f32 {
        if ending {
            return self.spec.final_sparsity;
        }
        // Phased pruning alternates pruned and dense periods
        if self.spec.phased && self.num_updates % 2 == 1 {
            return 0.0;
        }
        self.schedule().sparsity_at_epoch(ctx.epoch)
    }

    fn compute_masks(&mut self, model: &Model, sparsity: f32) -> Result<()> {
        let tensors = self
            .params
            .iter()
            .map(|name| {
                model
                    .param(name)
                    .map(|p| &p.data)
                    .ok_or_else(|| Error::UnknownParameter(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        self.masks = if self.global {
            global_magnitude_masks(&tensors, sparsity, &self.spec.mask_type)
        } else {
            tensors
                .iter()
                .map(|t| magnitude_mask(t, sparsity, &self.spec.mask_type))
                .collect()
        };
        Ok(())
    }

    fn apply_masks(&self, model: &mut Model) -> Result<()> {
        for (name, mask) in self.params.iter().zip(&self.masks) {
            let param = model.require_param_mut(name)?;
            apply_mask(name, &mut param.data, param.grad.as_mut(), mask)?;
        }
        Ok(())
    }

    fn reset_masks(&mut self) {
        for mask in &mut self.masks {
            mask.fill(1.0);
        }
    }
}

impl Modifier for MagnitudePruningModifier {
    fn name(&self) -> &str {
        self.name
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
        self.masks = self
            .params
            .iter()
            .map(|name| {
                model
                    .param(name)
                    .map(|p| ArrayD::ones(p.data.raw_dim()))
                    .ok_or_else(|| Error::UnknownParameter(name.clone()))
            })
            .collect::<Result<_>>()?;
        self.initialized = true;
        tracing::debug!(
            modifier = self.name,
            params = self.params.len(),
            global = self.global,
            mask_type = %self.spec.mask_type,
            "pruning modifier initialized"
        );
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
            return Err(Error::NotInitialized(self.name.to_string()));
        }
        let t = self.tracker.mark_update(ctx);
        let sparsity = self.target_sparsity(ctx, t.ended);

        self.compute_masks(model, sparsity)?;
        self.apply_masks(model)?;
        self.masks_enabled = true;
        self.applied_sparsity = Some(sparsity);
        self.num_updates += 1;

        if t.started {
            tracing::info!(modifier = self.name, epoch = ctx.epoch, sparsity, "pruning started");
        }
        tracing::debug!(
            modifier = self.name,
            epoch = ctx.epoch,
            sparsity,
            achieved = model.sparsity_of(&self.params),
            "pruning masks updated"
        );

        if t.ended {
            if !self.spec.leave_enabled {
                self.reset_masks();
                self.masks_enabled = false;
                self.applied_sparsity = Some(0.0);
            }
            tracing::info!(
                modifier = self.name,
                epoch = ctx.epoch,
                sparsity,
                leave_enabled = self.spec.leave_enabled,
                "pruning ended"
            );
        }
        Ok(())
    }

    fn optimizer_post_step(&mut self, model: &mut Model, _ctx: &ModifierContext) -> Result<()> {
        if self.masks_enabled {
            self.apply_masks(model)?;
        }
        Ok(())
    }

    fn finalize(&mut self, _model: &mut Model) -> Result<()> {
        self.tracker.force_end();
        Ok(())
    }

    fn applied_sparsity(&self) -> Option<f32> {
        self.applied_sparsity
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
            return Err(Error::NotInitialized(self.name.to_string()));
        }
        let mut loaded = 0;
        for (name, mask) in self.params.iter().zip(self.masks.iter_mut()) {
            let Some(saved) = state.get(&mask_key(name)) else {
                continue;
            };
            if saved.shape() != mask.shape() {
                return Err(Error::ShapeMismatch {
                    name: mask_key(name),
                    expected: mask.shape().to_vec(),
                    got: saved.shape().to_vec(),
                });
            }
            mask.assign(saved);
            loaded += 1;
        }
        if loaded > 0 {
            self.masks_enabled = true;
            self.apply_masks(model)?;
            tracing::debug!(modifier = self.name, masks = loaded, "masks restored");
        }
        Ok(())
    }
}
