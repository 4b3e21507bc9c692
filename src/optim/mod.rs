//! Optimizers and learning rate schedules driven by recipes

mod optimizer;
mod scheduled;
mod scheduler;
mod sgd;

pub use optimizer::{NoopOptimizer, Optimizer};
pub use scheduled::{apply_recipe, ScheduledOptimizer};
pub use scheduler::{
    CosineAnnealingLR, ExponentialLR, LRScheduler, LinearLR, MultiStepLR, StepDecayLR,
};
pub use sgd::SGD;
