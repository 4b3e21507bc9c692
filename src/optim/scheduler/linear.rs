//! Linear learning rate scheduler

use super::{progress, LRScheduler};

/// Linear Learning Rate Scheduler
///
/// Formula: lr = lr_init + (lr_final - lr_init) * p
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearLR {
    lr_init: f32,
    lr_final: f32,
    start_epoch: f64,
    end_epoch: f64,
}

impl LinearLR {
    pub fn new(lr_init: f32, lr_final: f32, start_epoch: f64, end_epoch: f64) -> Self {
        Self { lr_init, lr_final, start_epoch, end_epoch }
    }
}

impl LRScheduler for LinearLR {
    fn lr_at(&self, epoch: f64) -> f32 {
        let p = progress(epoch, self.start_epoch, self.end_epoch);
        (f64::from(self.lr_init) + f64::from(self.lr_final - self.lr_init) * p) as f32
    }
}
