//! Cosine annealing learning rate scheduler

use super::{progress, LRScheduler};
use std::f64::consts::PI;

/// Cosine Annealing Learning Rate Scheduler
///
/// Decreases the learning rate following a cosine curve from lr_max to lr_min
/// between `start_epoch` and `end_epoch`.
///
/// Formula: lr = lr_min + 0.5 * (lr_max - lr_min) * (1 + cos(pi * p))
///
/// Where p is the clamped progress through the epoch range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CosineAnnealingLR {
    lr_max: f32,
    lr_min: f32,
    start_epoch: f64,
    end_epoch: f64,
}

impl CosineAnnealingLR {
    /// Create a new cosine annealing scheduler
    ///
    /// # Arguments
    /// * `lr_max` - Initial (maximum) learning rate
    /// * `lr_min` - Final (minimum) learning rate
    /// * `start_epoch` / `end_epoch` - Epoch range of the decay
    pub fn new(lr_max: f32, lr_min: f32, start_epoch: f64, end_epoch: f64) -> Self {
        Self { lr_max, lr_min, start_epoch, end_epoch }
    }
}

impl LRScheduler for CosineAnnealingLR {
    fn lr_at(&self, epoch: f64) -> f32 {
        let p = progress(epoch, self.start_epoch, self.end_epoch);
        let cosine_decay = 0.5 * (1.0 + (PI * p).cos());
        (f64::from(self.lr_min) + f64::from(self.lr_max - self.lr_min) * cosine_decay) as f32
    }
}
