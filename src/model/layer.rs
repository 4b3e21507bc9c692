//! Layers and their parameters

use serde::{Deserialize, Serialize};
use ndarray::{ArrayD, IxDyn};

/// Layer category; decides what `__ALL_PRUNABLE__` covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    #[default]
    Linear,
    Conv,
    Embedding,
    Norm,
    Activation,
    Other,
}

impl LayerKind {
    /// Linear and convolution layers carry prunable weights.
    pub fn is_prunable(&self) -> bool {
        matches!(self, LayerKind::Linear | LayerKind::Conv)
    }
}

/// A named parameter array with an optional gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    /// Fully qualified name, `<layer>.<local>`.
    pub name: String,
    pub data: ArrayD<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grad: Option<ArrayD<f32>>,
}

impl Param {
    pub fn new(name: impl Into<String>, data: ArrayD<f32>) -> Self {
        Self {
            name: name.into(),
            data,
            grad: None,
        }
    }

    /// Build from a flat vector and shape.
    ///
    /// # Panics
    ///
    /// Panics if `values.len()` does not match the product of `shape`.
    pub fn from_shape_vec(name: impl Into<String>, shape: &[usize], values: Vec<f32>) -> Self {
        let data = ArrayD::from_shape_vec(IxDyn(shape), values)
            .unwrap_or_else(|e| panic!("parameter shape does not match data: {e}"));
        Self::new(name, data)
    }

    /// Name relative to its layer (`weight`, `bias`, ...).
    pub fn local_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn num_zeros(&self) -> usize {
        self.data.iter().filter(|v| **v == 0.0).count()
    }

    /// Fraction of elements equal to zero.
    pub fn sparsity(&self) -> f32 {
        if self.data.is_empty() {
            0.0
        } else {
            self.num_zeros() as f32 / self.data.len() as f32
        }
    }

    pub fn set_grad(&mut self, grad: ArrayD<f32>) {
        self.grad = Some(grad);
    }

    pub fn zero_grad(&mut self) {
        if let Some(g) = self.grad.as_mut() {
            g.fill(0.0);
        }
    }
}

/// A named layer. A bypassed layer behaves as identity in the external runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub kind: LayerKind,
    #[serde(default)]
    pub bypassed: bool,
    #[serde(default)]
    pub params: Vec<Param>,
}

impl Layer {
    pub fn new(name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            name: name.into(),
            kind,
            bypassed: false,
            params: Vec::new(),
        }
    }

    /// Add a parameter named `<layer>.<local>`.
    pub fn with_param(mut self, local: &str, data: ArrayD<f32>) -> Self {
        let name = format!("{}.{local}", self.name);
        self.params.push(Param::new(name, data));
        self
    }

    /// Linear layer with `[out, in]` weight and `[out]` bias.
    pub fn linear(name: impl Into<String>, weight: ArrayD<f32>, bias: Option<ArrayD<f32>>) -> Self {
        let layer = Self::new(name, LayerKind::Linear).with_param("weight", weight);
        match bias {
            Some(b) => layer.with_param("bias", b),
            None => layer,
        }
    }

    pub fn param(&self, local: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.local_name() == local)
    }
}
