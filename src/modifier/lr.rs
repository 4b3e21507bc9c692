//! Learning rate modifiers

use super::{Cadence, Modifier, ModifierContext, ScheduleTracker};
use crate::model::Model;
use crate::optim::{
    CosineAnnealingLR, ExponentialLR, LRScheduler, LinearLR, MultiStepLR, Optimizer, StepDecayLR,
};
use crate::recipe::{
    LearningRateFunctionSpec, LearningRateSpec, LrClass, LrFunc, SetLearningRateSpec,
};
use crate::Result;

/// Sets the optimizer learning rate once at `start_epoch`.
#[derive(Debug, Clone)]
pub struct SetLearningRateModifier {
    learning_rate: f32,
    tracker: ScheduleTracker,
}

impl SetLearningRateModifier {
    pub fn new(spec: &SetLearningRateSpec) -> Self {
        Self {
            learning_rate: spec.learning_rate,
            tracker: ScheduleTracker::new(spec.start_epoch, spec.end_epoch, Cadence::Never),
        }
    }

    pub fn learning_rate(&self) -> f32 {
        self.learning_rate
    }
}

impl Modifier for SetLearningRateModifier {
    fn name(&self) -> &str {
        "SetLearningRateModifier"
    }

    fn start_epoch(&self) -> f64 {
        self.tracker.start_epoch()
    }

    fn end_epoch(&self) -> f64 {
        self.tracker.end_epoch()
    }

    fn initialize(&mut self, _model: &mut Model, _ctx: &ModifierContext) -> Result<()> {
        Ok(())
    }

    fn update_ready(&self, ctx: &ModifierContext) -> bool {
        self.tracker.update_ready(ctx)
    }

    fn scheduled_update(
        &mut self,
        _model: &mut Model,
        optimizer: &mut dyn Optimizer,
        ctx: &ModifierContext,
    ) -> Result<()> {
        if self.tracker.mark_update(ctx).started {
            optimizer.set_lr(self.learning_rate);
            tracing::info!(epoch = ctx.epoch, lr = self.learning_rate, "learning rate set");
        }
        Ok(())
    }
}

/// Drives the optimizer learning rate along a schedule while active.
///
/// Covers both `LearningRateFunctionModifier` (linear or cosine curves) and
/// `LearningRateModifier` (step-wise decay).
#[derive(Debug)]
pub struct LearningRateModifier {
    name: &'static str,
    schedule: Box<dyn LRScheduler>,
    tracker: ScheduleTracker,
}

impl LearningRateModifier {
    pub fn from_function(spec: &LearningRateFunctionSpec) -> Self {
        let schedule: Box<dyn LRScheduler> = match spec.lr_func {
            LrFunc::Linear => Box::new(LinearLR::new(
                spec.init_lr,
                spec.final_lr,
                spec.start_epoch,
                spec.end_epoch,
            )),
            LrFunc::Cosine => Box::new(CosineAnnealingLR::new(
                spec.init_lr,
                spec.final_lr,
                spec.start_epoch,
                spec.end_epoch,
            )),
        };
        Self {
            name: "LearningRateFunctionModifier",
            schedule,
            tracker: ScheduleTracker::new(
                spec.start_epoch,
                spec.end_epoch,
                Cadence::from_frequency_or_every_step(spec.update_frequency),
            ),
        }
    }

    pub fn from_step(spec: &LearningRateSpec) -> Self {
        let kwargs = &spec.lr_kwargs;
        let schedule: Box<dyn LRScheduler> = match spec.lr_class {
            LrClass::Step => Box::new(StepDecayLR::new(
                spec.init_lr,
                kwargs.step_size.unwrap_or(0.0),
                kwargs.gamma,
                spec.start_epoch,
            )),
            LrClass::MultiStep => Box::new(MultiStepLR::new(
                spec.init_lr,
                kwargs.milestones.clone().unwrap_or_default(),
                kwargs.gamma,
            )),
            LrClass::Exponential => Box::new(ExponentialLR::new(
                spec.init_lr,
                kwargs.gamma,
                spec.start_epoch,
            )),
        };
        Self {
            name: "LearningRateModifier",
            schedule,
            tracker: ScheduleTracker::new(
                spec.start_epoch,
                spec.end_epoch,
                Cadence::from_frequency_or_every_step(spec.update_frequency),
            ),
        }
    }

    /// Learning rate the schedule prescribes at `epoch`.
    pub fn lr_at(&self, epoch: f64) -> f32 {
        self.schedule.lr_at(epoch)
    }
}

impl Modifier for LearningRateModifier {
    fn name(&self) -> &str {
        self.name
    }

    fn start_epoch(&self) -> f64 {
        self.tracker.start_epoch()
    }

    fn end_epoch(&self) -> f64 {
        self.tracker.end_epoch()
    }

    fn initialize(&mut self, _model: &mut Model, _ctx: &ModifierContext) -> Result<()> {
        Ok(())
    }

    fn update_ready(&self, ctx: &ModifierContext) -> bool {
        self.tracker.update_ready(ctx)
    }

    fn scheduled_update(
        &mut self,
        _model: &mut Model,
        optimizer: &mut dyn Optimizer,
        ctx: &ModifierContext,
    ) -> Result<()> {
        let t = self.tracker.mark_update(ctx);
        // Past the end the rate freezes at its end-of-range value
        let epoch = match self.tracker.end_epoch() {
            end if end >= 0.0 => ctx.epoch.min(end),
            _ => ctx.epoch,
        };
        self.schedule.apply(optimizer, epoch);
        if t.started {
            tracing::info!(modifier = self.name, epoch = ctx.epoch, lr = optimizer.lr(), "learning rate schedule started");
        } else {
            tracing::debug!(modifier = self.name, epoch = ctx.epoch, lr = optimizer.lr(), "learning rate updated");
        }
        if t.ended {
            tracing::info!(modifier = self.name, epoch = ctx.epoch, "learning rate schedule ended");
        }
        Ok(())
    }
}
