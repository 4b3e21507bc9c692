//! Bypassing whole layers

use super::{Cadence, Modifier, ModifierContext, ScheduleTracker};
use crate::model::Model;
use crate::optim::Optimizer;
use crate::recipe::LayerPruningSpec;
use crate::{Error, Result};

/// Marks the selected layers as bypassed (identity) between start and end.
#[derive(Debug, Clone)]
pub struct LayerPruningModifier {
    spec: LayerPruningSpec,
    tracker: ScheduleTracker,
    layers: Vec<String>,
    /// Bypass flags before this modifier touched the layers.
    previous: Vec<bool>,
    initialized: bool,
}

impl LayerPruningModifier {
    pub fn new(spec: LayerPruningSpec) -> Self {
        // The bypass is re-asserted at every check inside the window
        let tracker = ScheduleTracker::new(spec.start_epoch, spec.end_epoch, Cadence::EveryStep);
        Self {
            spec,
            tracker,
            layers: Vec::new(),
            previous: Vec::new(),
            initialized: false,
        }
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    fn bypass(&mut self, model: &mut Model) -> Result<()> {
        self.previous.clear();
        for name in &self.layers {
            let layer = model
                .layer_mut(name)
                .ok_or_else(|| Error::UnknownLayer(name.clone()))?;
            self.previous.push(layer.bypassed);
            layer.bypassed = true;
        }
        Ok(())
    }

    /// Bypass again without touching the saved flags.
    fn reassert(&self, model: &mut Model) -> Result<()> {
        for name in &self.layers {
            model
                .layer_mut(name)
                .ok_or_else(|| Error::UnknownLayer(name.clone()))?
                .bypassed = true;
        }
        Ok(())
    }

    fn restore(&mut self, model: &mut Model) -> Result<()> {
        for (name, was) in self.layers.iter().zip(self.previous.drain(..)) {
            let layer = model
                .layer_mut(name)
                .ok_or_else(|| Error::UnknownLayer(name.clone()))?;
            layer.bypassed = was;
        }
        Ok(())
    }
}

impl Modifier for LayerPruningModifier {
    fn name(&self) -> &str {
        "LayerPruningModifier"
    }

    fn start_epoch(&self) -> f64 {
        self.spec.start_epoch
    }

    fn end_epoch(&self) -> f64 {
        self.spec.end_epoch
    }

    fn initialize(&mut self, model: &mut Model, _ctx: &ModifierContext) -> Result<()> {
        self.layers = self
            .spec
            .layers
            .resolve(&model.layer_names(), &model.prunable_layer_names())?;
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
            self.bypass(model)?;
            tracing::info!(epoch = ctx.epoch, layers = ?self.layers, "layers bypassed");
        } else if !t.ended {
            self.reassert(model)?;
        }
        if t.ended {
            self.restore(model)?;
            tracing::info!(epoch = ctx.epoch, layers = ?self.layers, "layers restored");
        }
        Ok(())
    }
}
