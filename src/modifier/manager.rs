//! Recipe-driven modifier manager

use super::traits::StateDict;
use super::{
    ConstantPruningModifier, EpochRangeModifier, LayerPruningModifier, LearningRateModifier,
    MagnitudePruningModifier, Modifier, ModifierContext, MovementPruningModifier,
    SetLearningRateModifier,
};
use crate::model::Model;
use crate::optim::Optimizer;
use crate::recipe::{ModifierSpec, Recipe};
use crate::{Error, Result};

/// Build the runtime modifier for a recipe record.
pub fn build_modifier(spec: &ModifierSpec) -> Box<dyn Modifier> {
    match spec {
        ModifierSpec::EpochRange(s) => Box::new(EpochRangeModifier::new(s)),
        ModifierSpec::SetLearningRate(s) => Box::new(SetLearningRateModifier::new(s)),
        ModifierSpec::LearningRateFunction(s) => Box::new(LearningRateModifier::from_function(s)),
        ModifierSpec::LearningRate(s) => Box::new(LearningRateModifier::from_step(s)),
        ModifierSpec::GmPruning(s) => {
            Box::new(MagnitudePruningModifier::new("GMPruningModifier", s.clone(), false))
        }
        ModifierSpec::MagnitudePruning(s) => Box::new(MagnitudePruningModifier::new(
            "MagnitudePruningModifier",
            s.clone(),
            false,
        )),
        ModifierSpec::GlobalMagnitudePruning(s) => Box::new(MagnitudePruningModifier::new(
            "GlobalMagnitudePruningModifier",
            s.clone(),
            true,
        )),
        ModifierSpec::MovementPruning(s) => Box::new(MovementPruningModifier::new(s.clone())),
        ModifierSpec::ConstantPruning(s) => Box::new(ConstantPruningModifier::new(s.clone())),
        ModifierSpec::LayerPruning(s) => Box::new(LayerPruningModifier::new(s.clone())),
    }
}

/// Owns the modifiers of a recipe and drives them in recipe order.
#[derive(Debug, Default)]
pub struct ScheduledModifierManager {
    modifiers: Vec<Box<dyn Modifier>>,
    max_epochs: f64,
    initialized: bool,
}

impl ScheduledModifierManager {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            modifiers: recipe.modifiers().map(build_modifier).collect(),
            max_epochs: recipe.max_epochs(),
            initialized: false,
        }
    }

    pub fn from_modifiers(modifiers: Vec<Box<dyn Modifier>>) -> Self {
        let max_epochs = modifiers
            .iter()
            .flat_map(|m| [m.start_epoch(), m.end_epoch()])
            .filter(|e| *e >= 0.0)
            .fold(0.0, f64::max);
        Self {
            modifiers,
            max_epochs,
            initialized: false,
        }
    }

    pub fn modifiers(&self) -> &[Box<dyn Modifier>] {
        &self.modifiers
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    /// Last epoch any modifier touches.
    pub fn max_epochs(&self) -> f64 {
        self.max_epochs
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Resolve every modifier against `model`.
    ///
    /// # Errors
    ///
    /// Fails on the first selector that matches nothing.
    pub fn initialize(&mut self, model: &mut Model, ctx: &ModifierContext) -> Result<()> {
        for modifier in &mut self.modifiers {
            modifier.initialize(model, ctx)?;
        }
        self.initialized = true;
        tracing::debug!(modifiers = self.modifiers.len(), "modifier manager initialized");
        Ok(())
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(Error::NotInitialized("ScheduledModifierManager".to_string()))
        }
    }

    /// Run every due scheduled update; returns how many ran.
    pub fn update(
        &mut self,
        model: &mut Model,
        optimizer: &mut dyn Optimizer,
        ctx: &ModifierContext,
    ) -> Result<usize> {
        self.ensure_initialized()?;
        let mut ran = 0;
        for modifier in &mut self.modifiers {
            if modifier.update_ready(ctx) {
                modifier.scheduled_update(model, optimizer, ctx)?;
                ran += 1;
            }
        }
        Ok(ran)
    }

    pub fn optimizer_post_step(&mut self, model: &mut Model, ctx: &ModifierContext) -> Result<()> {
        self.ensure_initialized()?;
        for modifier in &mut self.modifiers {
            modifier.optimizer_post_step(model, ctx)?;
        }
        Ok(())
    }

    pub fn finalize(&mut self, model: &mut Model) -> Result<()> {
        for modifier in &mut self.modifiers {
            modifier.finalize(model)?;
        }
        Ok(())
    }

    /// Masks of every modifier; on a key clash the later modifier wins.
    pub fn state_dict(&self) -> StateDict {
        self.modifiers
            .iter()
            .flat_map(|m| m.state_dict())
            .collect()
    }

    pub fn load_state_dict(&mut self, model: &mut Model, state: &StateDict) -> Result<()> {
        self.ensure_initialized()?;
        for modifier in &mut self.modifiers {
            modifier.load_state_dict(model, state)?;
        }
        Ok(())
    }
}
