//! Parameter container that recipes act on
//!
//! A [`Model`] is an ordered list of named layers, each holding named `f32`
//! parameter arrays and optional gradients. There is no forward or backward
//! pass here: the training runtime lives outside this crate, and modifiers only
//! need names, shapes and values to build masks.
//!
//! Parameter names are `<layer>.<local>` (for example `encoder.fc1.weight`),
//! which is what recipe `params` selectors match against.

mod io;
mod layer;

#[cfg(test)]
mod tests;

pub use io::{load_model, save_model, ModelFormat};
pub use layer::{Layer, LayerKind, Param};

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Ordered collection of layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Model name, informational only.
    #[serde(default)]
    pub name: String,
    layers: Vec<Layer>,
}

impl Model {
    /// Create an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            layers: Vec::new(),
        }
    }

    /// Append a layer.
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    /// Append a layer in place.
    pub fn push_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name == name)
    }

    pub fn layer_mut(&mut self, name: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|l| l.name == name)
    }

    /// Iterate over all parameters in layer order.
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.layers.iter().flat_map(|l| l.params.iter())
    }

    /// Iterate mutably over all parameters in layer order.
    pub fn params_mut(&mut self) -> impl Iterator<Item = &mut Param> {
        self.layers.iter_mut().flat_map(|l| l.params.iter_mut())
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params().find(|p| p.name == name)
    }

    pub fn param_mut(&mut self, name: &str) -> Option<&mut Param> {
        self.params_mut().find(|p| p.name == name)
    }

    /// Look up a parameter, failing with [`Error::UnknownParameter`].
    pub fn require_param_mut(&mut self, name: &str) -> Result<&mut Param> {
        self.param_mut(name)
            .ok_or_else(|| Error::UnknownParameter(name.to_string()))
    }

    /// All parameter names in layer order.
    pub fn param_names(&self) -> Vec<String> {
        self.params().map(|p| p.name.clone()).collect()
    }

    /// Names of the weights of prunable layers (linear and convolution).
    pub fn prunable_param_names(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter(|l| l.kind.is_prunable())
            .flat_map(|l| l.params.iter())
            .filter(|p| p.local_name() == "weight")
            .map(|p| p.name.clone())
            .collect()
    }

    /// All layer names in order.
    pub fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.name.clone()).collect()
    }

    /// Names of prunable layers.
    pub fn prunable_layer_names(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter(|l| l.kind.is_prunable())
            .map(|l| l.name.clone())
            .collect()
    }

    /// Total number of scalar parameters.
    pub fn num_elements(&self) -> usize {
        self.params().map(Param::len).sum()
    }

    /// Fraction of zero-valued elements across the given parameters.
    ///
    /// Returns 0.0 when the selection is empty.
    pub fn sparsity_of<S: AsRef<str>>(&self, names: &[S]) -> f32 {
        let (zeros, total) = names
            .iter()
            .filter_map(|n| self.param(n.as_ref()))
            .fold((0usize, 0usize), |(z, t), p| (z + p.num_zeros(), t + p.len()));
        if total == 0 {
            0.0
        } else {
            zeros as f32 / total as f32
        }
    }

    /// Zero every gradient.
    pub fn zero_grad(&mut self) {
        for p in self.params_mut() {
            p.zero_grad();
        }
    }
}
