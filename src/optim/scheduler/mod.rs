//! Learning rate schedules
//!
//! Epoch-driven learning rate curves used by the learning rate modifiers:
//! - `LinearLR` - Linear interpolation between two rates
//! - `CosineAnnealingLR` - Smooth cosine decay
//! - `StepDecayLR` - Decay by a factor every N epochs
//! - `MultiStepLR` - Decay by a factor at each milestone epoch
//! - `ExponentialLR` - Decay by a factor once per epoch

mod cosine_annealing;
mod exponential;
mod linear;
mod multi_step;
mod step_decay;


pub use cosine_annealing::CosineAnnealingLR;
pub use exponential::ExponentialLR;
pub use linear::LinearLR;
pub use multi_step::MultiStepLR;
pub use step_decay::StepDecayLR;

use crate::optim::Optimizer;

/// Learning rate as a function of the (fractional) epoch
pub trait LRScheduler: Send + std::fmt::Debug {
    /// Learning rate at `epoch`
    fn lr_at(&self, epoch: f64) -> f32;

    /// Apply the learning rate at `epoch` to an optimizer
    fn apply(&self, optimizer: &mut dyn Optimizer, epoch: f64) {
        optimizer.set_lr(self.lr_at(epoch));
    }
}

/// Progress through `[start, end]`, clamped to `[0, 1]`.
pub(crate) fn progress(epoch: f64, start: f64, end: f64) -> f64 {
    if end <= start {
        return if epoch >= start { 1.0 } else { 0.0 };
    }
    ((epoch - start) / (end - start)).clamp(0.0, 1.0)
}
