//! Schedule-driven modifiers
//!
//! Each recipe record becomes a [`Modifier`]. The [`ScheduledModifierManager`]
//! owns them and is driven once per training step with an explicit
//! [`ModifierContext`]:
//!
//! ```text
//! manager.update(model, optimizer, ctx)     // before the optimizer step
//! optimizer.step(model)
//! manager.optimizer_post_step(model, ctx)   // re-applies masks
//! ```
//!
//! [`crate::optim::ScheduledOptimizer`] wraps exactly this loop.

mod constant;
mod context;
mod layer_pruning;
mod lr;
mod magnitude;
mod manager;
mod movement;
mod range;
mod schedule;
mod traits;


pub use constant::ConstantPruningModifier;
pub use context::ModifierContext;
pub use layer_pruning::LayerPruningModifier;
pub use lr::{LearningRateModifier, SetLearningRateModifier};
pub use magnitude::MagnitudePruningModifier;
pub use manager::{build_modifier, ScheduledModifierManager};
pub use movement::MovementPruningModifier;
pub use range::EpochRangeModifier;
pub use schedule::{Cadence, Phase, ScheduleTracker, Transition};
pub use traits::{mask_key, Modifier, StateDict};
