//! Multi-step learning rate scheduler

use super::LRScheduler;

/// Multi-Step Learning Rate Scheduler
///
/// Multiplies learning rate by gamma at each milestone epoch reached.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiStepLR {
    lr_initial: f32,
    gamma: f64,
    milestones: Vec<f64>,
}

impl MultiStepLR {
    /// Milestones are absolute epochs.
    pub fn new(lr_initial: f32, milestones: Vec<f64>, gamma: f64) -> Self {
        Self { lr_initial, gamma, milestones }
    }
}

impl LRScheduler for MultiStepLR {
    fn lr_at(&self, epoch: f64) -> f32 {
        let passed = self.milestones.iter().filter(|m| epoch + 1e-9 >= **m).count();
        (f64::from(self.lr_initial) * self.gamma.powi(passed as i32)) as f32
    }
}
