//! Optimizer wrapper that drives a modifier schedule

use super::{NoopOptimizer, Optimizer};
use crate::model::Model;
use crate::modifier::{ModifierContext, ScheduledModifierManager};
use crate::recipe::Recipe;
use crate::Result;

/// Runs the modifier manager around every optimizer step.
///
/// Each [`ScheduledOptimizer::step`] performs, in order: scheduled modifier
/// updates, the wrapped optimizer step, then post-step mask re-application.
#[derive(Debug)]
pub struct ScheduledOptimizer<O: Optimizer> {
    inner: O,
    manager: ScheduledModifierManager,
    steps_per_epoch: usize,
    step: u64,
}

impl<O: Optimizer> ScheduledOptimizer<O> {
    /// Wrap `inner` and initialize `manager` against `model`.
    pub fn new(
        inner: O,
        mut manager: ScheduledModifierManager,
        model: &mut Model,
        steps_per_epoch: usize,
    ) -> Result<Self> {
        let steps_per_epoch = steps_per_epoch.max(1);
        if !manager.is_initialized() {
            manager.initialize(model, &ModifierContext::at_step(0, steps_per_epoch))?;
        }
        Ok(Self {
            inner,
            manager,
            steps_per_epoch,
            step: 0,
        })
    }

    pub fn context(&self) -> ModifierContext {
        ModifierContext::at_step(self.step, self.steps_per_epoch)
    }

    pub fn epoch(&self) -> f64 {
        self.context().epoch
    }

    pub fn global_step(&self) -> u64 {
        self.step
    }

    pub fn step(&mut self, model: &mut Model) -> Result<()> {
        let ctx = self.context();
        self.manager.update(model, &mut self.inner, &ctx)?;
        self.inner.step(model);
        self.manager.optimizer_post_step(model, &ctx)?;
        self.step += 1;
        Ok(())
    }

    /// Total steps needed to reach the end of the schedule, inclusive.
    pub fn total_steps(&self) -> u64 {
        (self.manager.max_epochs() * self.steps_per_epoch as f64).ceil() as u64 + 1
    }

    pub fn lr(&self) -> f32 {
        self.inner.lr()
    }

    pub fn finalize(&mut self, model: &mut Model) -> Result<()> {
        self.manager.finalize(model)
    }

    pub fn manager(&self) -> &ScheduledModifierManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut ScheduledModifierManager {
        &mut self.manager
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn into_parts(self) -> (O, ScheduledModifierManager) {
        (self.inner, self.manager)
    }
}

/// Replay a whole recipe over `model` without training.
///
/// The returned optimizer carries the finalized manager and final learning
/// rate.
pub fn apply_recipe(
    recipe: &Recipe,
    model: &mut Model,
    steps_per_epoch: usize,
) -> Result<ScheduledOptimizer<NoopOptimizer>> {
    let manager = ScheduledModifierManager::from_recipe(recipe);
    let mut optimizer =
        ScheduledOptimizer::new(NoopOptimizer::default(), manager, model, steps_per_epoch)?;
    let total = optimizer.total_steps();
    tracing::debug!(steps = total, steps_per_epoch, "replaying recipe");
    for _ in 0..total {
        optimizer.step(model)?;
    }
    optimizer.finalize(model)?;
    Ok(optimizer)
}
