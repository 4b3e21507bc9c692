//! Movement pruning
//!
//! Same ramp and cadence as gradual magnitude pruning, but weights are ranked
//! by how they move during training rather than by size. Every optimizer step
//! adds `-w * grad` to a per-weight score; weights heading towards zero gather
//! negative scores and are pruned first.

use super::traits::{mask_key, StateDict};
use super::{Cadence, Modifier, ModifierContext, Phase, ScheduleTracker};
use crate::model::Model;
use crate::optim::Optimizer;
use crate::prune::{apply_mask, score_masks};
use crate::recipe::MovementPruningSpec;
use crate::{Error, Result};
use ndarray::{ArrayD, Zip};

#[derive(Debug, Clone)]
pub struct MovementPruningModifier {
    spec: MovementPruningSpec,
    tracker: ScheduleTracker,
    params: Vec<String>,
    scores: Vec<ArrayD<f32>>,
    masks: Vec<ArrayD<f32>>,
    masks_enabled: bool,
    applied_sparsity: Option<f32>,
    initialized: bool,
}

impl MovementPruningModifier {
    pub fn new(spec: MovementPruningSpec) -> Self {
        let tracker = ScheduleTracker::new(
            spec.start_epoch,
            spec.end_epoch,
            Cadence::from_frequency(spec.update_frequency),
        );
        Self {
            spec,
            tracker,
            params: Vec::new(),
            scores: Vec::new(),
            masks: Vec::new(),
            masks_enabled: false,
            applied_sparsity: None,
            initialized: false,
        }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Accumulated movement score of a selected param.
    pub fn score(&self, param: &str) -> Option<&ArrayD<f32>> {
        self.params
            .iter()
            .position(|p| p == param)
            .map(|i| &self.scores[i])
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

    fn accumulate_scores(&mut self, model: &Model) -> Result<()> {
        for (name, score) in self.params.iter().zip(self.scores.iter_mut()) {
            let param = model
                .param(name)
                .ok_or_else(|| Error::UnknownParameter(name.clone()))?;
            let Some(grad) = &param.grad else {
                continue;
            };
            if grad.shape() != score.shape() {
                return Err(Error::ShapeMismatch {
                    name: name.clone(),
                    expected: score.shape().to_vec(),
                    got: grad.shape().to_vec(),
                });
            }
            Zip::from(score)
                .and(&param.data)
                .and(grad)
                .for_each(|s, &w, &g| *s -= w * g);
        }
        Ok(())
    }

    fn apply_masks(&self, model: &mut Model) -> Result<()> {
        for (name, mask) in self.params.iter().zip(&self.masks) {
            let param = model.require_param_mut(name)?;
            apply_mask(name, &mut param.data, param.grad.as_mut(), mask)?;
        }
        Ok(())
    }
}

impl Modifier for MovementPruningModifier {
    fn name(&self) -> &str {
        "MovementPruningModifier"
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
        let shapes = self
            .params
            .iter()
            .map(|name| {
                model
                    .param(name)
                    .map(|p| p.data.raw_dim())
                    .ok_or_else(|| Error::UnknownParameter(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;
        self.scores = shapes.iter().map(|d| ArrayD::zeros(d.clone())).collect();
        self.masks = shapes.into_iter().map(ArrayD::ones).collect();
        self.initialized = true;
        tracing::debug!(
            params = self.params.len(),
            mask_type = %self.spec.mask_type,
            "movement pruning initialized"
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
            return Err(Error::NotInitialized(self.name().to_string()));
        }
        let t = self.tracker.mark_update(ctx);
        let sparsity = if t.ended {
            self.spec.final_sparsity
        } else {
            self.spec.schedule().sparsity_at_epoch(ctx.epoch)
        };

        let mask_type = &self.spec.mask_type;
        self.masks = self
            .scores
            .iter()
            .flat_map(|s| score_masks(&[s], sparsity, mask_type))
            .collect();
        self.apply_masks(model)?;
        self.masks_enabled = true;
        self.applied_sparsity = Some(sparsity);

        if t.started {
            tracing::info!(epoch = ctx.epoch, sparsity, "movement pruning started");
        }
        tracing::debug!(
            epoch = ctx.epoch,
            sparsity,
            achieved = model.sparsity_of(&self.params),
            "movement masks updated"
        );

        if t.ended {
            if !self.spec.leave_enabled {
                self.masks.iter_mut().for_each(|m| m.fill(1.0));
                self.masks_enabled = false;
                self.applied_sparsity = Some(0.0);
            }
            tracing::info!(
                epoch = ctx.epoch,
                leave_enabled = self.spec.leave_enabled,
                "movement pruning ended"
            );
        }
        Ok(())
    }

    fn optimizer_post_step(&mut self, model: &mut Model, _ctx: &ModifierContext) -> Result<()> {
        if self.tracker.phase() != Phase::Ended {
            self.accumulate_scores(model)?;
        }
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
            return Err(Error::NotInitialized(self.name().to_string()));
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
        }
        Ok(())
    }
}
