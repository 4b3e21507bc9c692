//! Step decay learning rate scheduler

use super::LRScheduler;

/// Step Decay Learning Rate Scheduler
///
/// Multiplies learning rate by gamma every step_size epochs.
///
/// Formula: lr = lr_initial * gamma^(floor((epoch - start) / step_size))
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepDecayLR {
    lr_initial: f32,
    gamma: f64,
    step_size: f64,
    start_epoch: f64,
}

impl StepDecayLR {
    /// Create a new step decay scheduler
    ///
    /// # Arguments
    /// * `lr_initial` - Initial learning rate
    /// * `step_size` - Decay LR every step_size epochs
    /// * `gamma` - Multiplicative factor (e.g., 0.1 for 10x reduction)
    /// * `start_epoch` - Epoch the schedule starts counting from
    pub fn new(lr_initial: f32, step_size: f64, gamma: f64, start_epoch: f64) -> Self {
        Self { lr_initial, gamma, step_size, start_epoch }
    }
}

impl LRScheduler for StepDecayLR {
    fn lr_at(&self, epoch: f64) -> f32 {
        if self.step_size <= 0.0 {
            return self.lr_initial;
        }
        let elapsed = (epoch - self.start_epoch).max(0.0);
        // Small slack so 2.9999999 epochs from float steps still counts as 3
        let num_decays = ((elapsed + 1e-9) / self.step_size).floor();
        (f64::from(self.lr_initial) * self.gamma.powf(num_decays)) as f32
    }
}
