//! Sparsity ramp over an epoch window
//!
//! The target sparsity is `init_sparsity` before the window,
//! `final_sparsity` after it, and follows the interpolation function in
//! between.
//!
//! # References
//! - Zhu, M., & Gupta, S. (2017). To prune, or not to prune: exploring the
//!   efficacy of pruning for model compression. arXiv:1710.01878.

use super::interpolate::{interpolate, InterpolationFunc};
use serde::{Deserialize, Serialize};

/// Sparsity targets across an epoch window.
///
/// # Example
///
/// ```
/// use podar::prune::{InterpolationFunc, SparsitySchedule};
///
/// let schedule = SparsitySchedule {
///     init_sparsity: 0.05,
///     final_sparsity: 0.8,
///     start_epoch: 5.0,
///     end_epoch: 15.0,
///     inter_func: InterpolationFunc::Linear,
/// };
/// assert_eq!(schedule.sparsity_at_epoch(0.0), 0.05);
/// assert_eq!(schedule.sparsity_at_epoch(15.0), 0.8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SparsitySchedule {
    pub init_sparsity: f32,
    pub final_sparsity: f32,
    pub start_epoch: f64,
    pub end_epoch: f64,
    pub inter_func: InterpolationFunc,
}

impl SparsitySchedule {
    /// Target sparsity at a (fractional) epoch.
    pub fn sparsity_at_epoch(&self, epoch: f64) -> f32 {
        let s = interpolate(
            epoch,
            self.start_epoch,
            self.end_epoch,
            f64::from(self.init_sparsity),
            f64::from(self.final_sparsity),
            self.inter_func,
        ) as f32;
        s.clamp(0.0, 1.0)
    }

    /// Whether the ramp has reached its final value.
    pub fn is_complete(&self, epoch: f64) -> bool {
        epoch >= self.end_epoch
    }

    /// Check the ramp is well formed.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending field.
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("init_sparsity", self.init_sparsity),
            ("final_sparsity", self.final_sparsity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{field} ({value}) must be between 0.0 and 1.0"));
            }
        }
        if self.init_sparsity > self.final_sparsity {
            return Err(format!(
                "init_sparsity ({}) must not exceed final_sparsity ({})",
                self.init_sparsity, self.final_sparsity
            ));
        }
        if self.start_epoch < 0.0 {
            return Err(format!(
                "start_epoch ({}) must be non-negative",
                self.start_epoch
            ));
        }
        if self.end_epoch <= self.start_epoch {
            return Err(format!(
                "end_epoch ({}) must be greater than start_epoch ({})",
                self.end_epoch, self.start_epoch
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cubic() -> SparsitySchedule {
        SparsitySchedule {
            init_sparsity: 0.05,
            final_sparsity: 0.95,
            start_epoch: 10.0,
            end_epoch: 25.0,
            inter_func: InterpolationFunc::Cubic,
        }
    }

    #[test]
    fn test_before_start_returns_initial() {
        // TEST_ID: SCHED-001
        assert_eq!(
            cubic().sparsity_at_epoch(0.0),
            0.05,
            "SCHED-001 FALSIFIED: ramp must hold init_sparsity before start"
        );
    }

    #[test]
    fn test_at_start_and_end() {
        // TEST_ID: SCHED-002
        let s = cubic();
        assert_eq!(s.sparsity_at_epoch(10.0), 0.05);
        assert_eq!(s.sparsity_at_epoch(25.0), 0.95);
        assert_eq!(s.sparsity_at_epoch(40.0), 0.95);
    }

    #[test]
    fn test_is_complete() {
        let s = cubic();
        assert!(!s.is_complete(24.9));
        assert!(s.is_complete(25.0));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        // TEST_ID: SCHED-010
        let mut s = cubic();
        s.final_sparsity = 1.2;
        assert!(s.validate().unwrap_err().contains("final_sparsity"));
        let mut s = cubic();
        s.init_sparsity = -0.1;
        assert!(s.validate().unwrap_err().contains("init_sparsity"));
    }

    #[test]
    fn test_validate_rejects_decreasing_ramp() {
        // TEST_ID: SCHED-011
        let mut s = cubic();
        s.init_sparsity = 0.9;
        s.final_sparsity = 0.5;
        assert!(s.validate().unwrap_err().contains("must not exceed"));
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        // TEST_ID: SCHED-012
        let mut s = cubic();
        s.end_epoch = 10.0;
        assert!(s.validate().is_err());
        let mut s = cubic();
        s.start_epoch = -1.0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_accepts_flat_ramp() {
        let mut s = cubic();
        s.init_sparsity = 0.9;
        s.final_sparsity = 0.9;
        assert!(s.validate().is_ok());
    }

    proptest! {
        /// Target sparsity stays within [init, final]
        #[test]
        fn sparsity_bounded(
            start in 0.0f64..20.0,
            len in 0.1f64..20.0,
            init in 0.0f32..0.5,
            fin in 0.5f32..1.0,
            epoch in 0.0f64..60.0,
        ) {
            let s = SparsitySchedule {
                init_sparsity: init,
                final_sparsity: fin,
                start_epoch: start,
                end_epoch: start + len,
                inter_func: InterpolationFunc::Cubic,
            };
            let v = s.sparsity_at_epoch(epoch);
            prop_assert!(v >= init - 1e-6 && v <= fin + 1e-6);
        }
    }
}
