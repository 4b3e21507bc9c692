//! Exponential learning rate scheduler

use super::LRScheduler;

/// Exponential Learning Rate Scheduler
///
/// Formula: lr = lr_initial * gamma^(floor(epoch - start))
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialLR {
    lr_initial: f32,
    gamma: f64,
    start_epoch: f64,
}

impl ExponentialLR {
    pub fn new(lr_initial: f32, gamma: f64, start_epoch: f64) -> Self {
        Self { lr_initial, gamma, start_epoch }
    }
}

impl LRScheduler for ExponentialLR {
    fn lr_at(&self, epoch: f64) -> f32 {
        let elapsed = (epoch - self.start_epoch + 1e-9).max(0.0).floor();
        (f64::from(self.lr_initial) * self.gamma.powf(elapsed)) as f32
    }
}
