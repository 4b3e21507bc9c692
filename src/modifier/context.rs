//! Run-wide training position passed to every modifier call

/// Where training currently is.
///
/// Modifiers compare positions in whole steps: an epoch `e` maps to step
/// `round(e * steps_per_epoch)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModifierContext {
    pub epoch: f64,
    pub steps_per_epoch: usize,
}

impl ModifierContext {
    /// `steps_per_epoch` is clamped to at least one.
    pub fn new(epoch: f64, steps_per_epoch: usize) -> Self {
        Self {
            epoch,
            steps_per_epoch: steps_per_epoch.max(1),
        }
    }

    /// Context for a global step counter.
    pub fn at_step(step: u64, steps_per_epoch: usize) -> Self {
        let spe = steps_per_epoch.max(1);
        Self::new(step as f64 / spe as f64, spe)
    }

    pub fn step(&self) -> i64 {
        self.epoch_to_step(self.epoch)
    }

    pub fn epoch_to_step(&self, epoch: f64) -> i64 {
        (epoch * self.steps_per_epoch as f64).round() as i64
    }

    /// Whole steps covered by a frequency given in epochs, at least one.
    pub fn frequency_steps(&self, epochs: f64) -> i64 {
        self.epoch_to_step(epochs).max(1)
    }
}
