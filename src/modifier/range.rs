//! Epoch range declaration

use super::{Cadence, Modifier, ModifierContext, ScheduleTracker};
use crate::model::Model;
use crate::optim::Optimizer;
use crate::recipe::EpochRangeSpec;
use crate::Result;

/// Declares the training range; it changes nothing on the model.
#[derive(Debug, Clone)]
pub struct EpochRangeModifier {
    tracker: ScheduleTracker,
}

impl EpochRangeModifier {
    pub fn new(spec: &EpochRangeSpec) -> Self {
        Self {
            tracker: ScheduleTracker::new(spec.start_epoch, spec.end_epoch, Cadence::Never),
        }
    }
}

impl Modifier for EpochRangeModifier {
    fn name(&self) -> &str {
        "EpochRangeModifier"
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
        _optimizer: &mut dyn Optimizer,
        ctx: &ModifierContext,
    ) -> Result<()> {
        let t = self.tracker.mark_update(ctx);
        if t.started {
            tracing::info!(epoch = ctx.epoch, "training range started");
        }
        if t.ended {
            tracing::info!(epoch = ctx.epoch, "training range ended");
        }
        Ok(())
    }
}
