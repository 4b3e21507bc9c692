//! Magnitude mask creation
//!
//! Masks are `f32` arrays of the parameter's shape holding `1.0` (keep) or
//! `0.0` (pruned). Elements are scored in groups decided by [`MaskType`]:
//! single elements for unstructured pruning, output filters (dim 0), input
//! channels (dim 1), or rectangular blocks of the 2-D view `[dim0, rest]`.
//! A group's score is the mean absolute value of its elements, or for
//! [`score_masks`] the mean of precomputed scores; the
//! `round(sparsity * groups)` lowest-scoring groups are pruned. Equal scores
//! keep their original order, so lower indices are pruned first.


use crate::{Error, Result};
use ndarray::{ArrayD, Zip};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structure of the groups pruned together.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "MaskTypeRepr", into = "MaskTypeRepr")]
pub enum MaskType {
    /// Any element can be pruned on its own.
    #[default]
    Unstructured,
    /// Whole input channels (dim 1).
    Channel,
    /// Whole output filters (dim 0).
    Filter,
    /// Blocks of `[rows, cols]` over the `[dim0, rest]` view.
    Block(usize, usize),
}

/// Recipe representation: a name or a block shape list such as `[1, 4]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum MaskTypeRepr {
    Name(String),
    Shape(Vec<usize>),
}

impl TryFrom<MaskTypeRepr> for MaskType {
    type Error = String;

    fn try_from(repr: MaskTypeRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            MaskTypeRepr::Name(name) => match name.to_lowercase().as_str() {
                "unstructured" => Ok(MaskType::Unstructured),
                "channel" => Ok(MaskType::Channel),
                "filter" => Ok(MaskType::Filter),
                "block" => Ok(MaskType::Block(1, 4)),
                _ => Err(format!(
                    "unknown mask_type '{name}' (expected unstructured, channel, filter, block or [rows, cols])"
                )),
            },
            MaskTypeRepr::Shape(shape) => match shape.as_slice() {
                [rows, cols] if *rows > 0 && *cols > 0 => Ok(MaskType::Block(*rows, *cols)),
                _ => Err(format!(
                    "block mask_type must be two positive sizes, got {shape:?}"
                )),
            },
        }
    }
}

impl From<MaskType> for MaskTypeRepr {
    fn from(mask_type: MaskType) -> Self {
        match mask_type {
            MaskType::Unstructured => MaskTypeRepr::Name("unstructured".to_string()),
            MaskType::Channel => MaskTypeRepr::Name("channel".to_string()),
            MaskType::Filter => MaskTypeRepr::Name("filter".to_string()),
            MaskType::Block(r, c) => MaskTypeRepr::Shape(vec![r, c]),
        }
    }
}

impl fmt::Display for MaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaskType::Unstructured => write!(f, "unstructured"),
            MaskType::Channel => write!(f, "channel"),
            MaskType::Filter => write!(f, "filter"),
            MaskType::Block(r, c) => write!(f, "block[{r}, {c}]"),
        }
    }
}

impl MaskType {
    pub fn is_structured(&self) -> bool {
        !matches!(self, MaskType::Unstructured)
    }

    /// Assign every element of a tensor of `shape` to a group.
    fn layout(&self, shape: &[usize]) -> GroupLayout {
        let len: usize = shape.iter().product();
        match self {
            MaskType::Unstructured => GroupLayout::identity(len),
            MaskType::Filter => {
                let filters = shape.first().copied().unwrap_or(1).max(1);
                let per = (len / filters).max(1);
                GroupLayout::from_fn(len, filters, |i| i / per)
            }
            MaskType::Channel => {
                if shape.len() < 2 {
                    return GroupLayout::identity(len);
                }
                let channels = shape[1].max(1);
                let inner: usize = shape[2..].iter().product::<usize>().max(1);
                GroupLayout::from_fn(len, channels, |i| (i / inner) % channels)
            }
            MaskType::Block(br, bc) => {
                let (rows, cols) = match shape {
                    [] => (1, 1),
                    [n] => (1, *n),
                    [n, ..] => (*n, len / (*n).max(1)),
                };
                let cols = cols.max(1);
                let block_cols = cols.div_ceil(*bc);
                let block_rows = rows.div_ceil(*br).max(1);
                GroupLayout::from_fn(len, block_rows * block_cols, |i| {
                    let (r, c) = (i / cols, i % cols);
                    (r / br) * block_cols + c / bc
                })
            }
        }
    }
}

/// Element-to-group assignment for one tensor.
struct GroupLayout {
    group_of: Vec<usize>,
    num_groups: usize,
}

impl GroupLayout {
    fn identity(len: usize) -> Self {
        Self {
            group_of: (0..len).collect(),
            num_groups: len,
        }
    }

    fn from_fn(len: usize, num_groups: usize, f: impl Fn(usize) -> usize) -> Self {
        Self {
            group_of: (0..len).map(f).collect(),
            num_groups,
        }
    }

    /// Mean of `element(v)` per group, in flat (row-major) element order.
    fn scores(&self, values: &ArrayD<f32>, element: fn(f32) -> f32) -> Vec<f32> {
        let mut sums = vec![0.0f32; self.num_groups];
        let mut counts = vec![0usize; self.num_groups];
        for (&g, v) in self.group_of.iter().zip(values.iter()) {
            sums[g] += element(*v);
            counts[g] += 1;
        }
        sums.iter()
            .zip(&counts)
            .map(|(s, &c)| if c == 0 { 0.0 } else { s / c as f32 })
            .collect()
    }
}

/// Number of groups to prune for a sparsity level.
fn num_to_prune(sparsity: f32, groups: usize) -> usize {
    ((sparsity.clamp(0.0, 1.0) * groups as f32).round() as usize).min(groups)
}

/// Mask pruning the lowest-magnitude fraction of one tensor.
///
/// # Example
///
/// ```
/// use podar::prune::{magnitude_mask, MaskType};
/// use ndarray::arr1;
///
/// let w = arr1(&[0.5f32, -0.1, 0.3, 0.05]).into_dyn();
/// let mask = magnitude_mask(&w, 0.5, &MaskType::Unstructured);
/// assert_eq!(mask.as_slice().unwrap(), &[1.0, 0.0, 1.0, 0.0]);
/// ```
pub fn magnitude_mask(values: &ArrayD<f32>, sparsity: f32, mask_type: &MaskType) -> ArrayD<f32> {
    global_magnitude_masks(&[values], sparsity, mask_type)
        .pop()
        .unwrap_or_else(|| ArrayD::ones(values.raw_dim()))
}

/// Masks ranking groups of all tensors jointly against one threshold.
///
/// The returned masks are in the order of `tensors`.
pub fn global_magnitude_masks(
    tensors: &[&ArrayD<f32>],
    sparsity: f32,
    mask_type: &MaskType,
) -> Vec<ArrayD<f32>> {
    ranked_masks(tensors, sparsity, mask_type, f32::abs)
}

/// Masks pruning the groups with the lowest mean score, ranked jointly.
///
/// Scores are signed; the masks take the shapes of `scores`.
pub fn score_masks(
    scores: &[&ArrayD<f32>],
    sparsity: f32,
    mask_type: &MaskType,
) -> Vec<ArrayD<f32>> {
    ranked_masks(scores, sparsity, mask_type, |v| v)
}

fn ranked_masks(
    tensors: &[&ArrayD<f32>],
    sparsity: f32,
    mask_type: &MaskType,
    element: fn(f32) -> f32,
) -> Vec<ArrayD<f32>> {
    let layouts: Vec<GroupLayout> = tensors.iter().map(|t| mask_type.layout(t.shape())).collect();

    // (tensor index, group index, score) across every tensor
    let mut ranked: Vec<(usize, usize, f32)> = layouts
        .iter()
        .zip(tensors)
        .enumerate()
        .flat_map(|(ti, (layout, t))| {
            layout
                .scores(t, element)
                .into_iter()
                .enumerate()
                .map(move |(gi, s)| (ti, gi, s))
        })
        .collect();

    let n_prune = num_to_prune(sparsity, ranked.len());
    ranked.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut pruned: Vec<Vec<bool>> = layouts.iter().map(|l| vec![false; l.num_groups]).collect();
    for &(ti, gi, _) in &ranked[..n_prune] {
        pruned[ti][gi] = true;
    }

    tensors
        .iter()
        .zip(&layouts)
        .zip(&pruned)
        .map(|((t, layout), groups)| {
            let flat: Vec<f32> = layout
                .group_of
                .iter()
                .map(|&g| if groups[g] { 0.0 } else { 1.0 })
                .collect();
            ArrayD::from_shape_vec(t.raw_dim(), flat)
                .unwrap_or_else(|_| ArrayD::ones(t.raw_dim()))
        })
        .collect()
}

/// Mask keeping exactly the currently non-zero elements.
pub fn nonzero_mask(values: &ArrayD<f32>) -> ArrayD<f32> {
    values.mapv(|v| if v == 0.0 { 0.0 } else { 1.0 })
}

/// Fraction of zeros in a mask.
pub fn mask_sparsity(mask: &ArrayD<f32>) -> f32 {
    if mask.is_empty() {
        return 0.0;
    }
    mask.iter().filter(|v| **v == 0.0).count() as f32 / mask.len() as f32
}

/// Multiply `values` (and `grad`, when present) by `mask` in place.
///
/// # Errors
///
/// Returns [`Error::ShapeMismatch`] when the shapes differ.
pub fn apply_mask(
    name: &str,
    values: &mut ArrayD<f32>,
    grad: Option<&mut ArrayD<f32>>,
    mask: &ArrayD<f32>,
) -> Result<()> {
    if values.shape() != mask.shape() {
        return Err(Error::ShapeMismatch {
            name: name.to_string(),
            expected: values.shape().to_vec(),
            got: mask.shape().to_vec(),
        });
    }
    Zip::from(&mut *values).and(mask).for_each(|v, &m| *v *= m);
    if let Some(g) = grad {
        if g.shape() == mask.shape() {
            Zip::from(g).and(mask).for_each(|v, &m| *v *= m);
        }
    }
    Ok(())
}
