//! Pruning primitives shared by the pruning modifiers
//!
//! - **Interpolation**: linear, cubic and inverse-cubic ramps
//! - **Sparsity schedules**: target sparsity as a function of epoch
//! - **Masks**: magnitude-based unstructured and structured masks
//! - **Selectors**: which parameters or layers a modifier governs
//!
//! # References
//!
//! - Han, S., et al. (2015). Learning both weights and connections. NeurIPS.
//! - Zhu, M., & Gupta, S. (2017). To prune, or not to prune. arXiv:1710.01878.

mod interpolate;
mod mask;
mod schedule;
mod selector;

pub use interpolate::{interpolate, InterpolationFunc};
pub use mask::{
    apply_mask, global_magnitude_masks, magnitude_mask, mask_sparsity, nonzero_mask, score_masks,
    MaskType,
};
pub use schedule::SparsitySchedule;
pub use selector::{ParamSelector, ALL_PRUNABLE_TOKEN, ALL_TOKEN};
