//! Stochastic Gradient Descent optimizer

use super::Optimizer;
use crate::model::Model;
use ndarray::ArrayD;
use std::collections::HashMap;

/// SGD optimizer with optional momentum
#[derive(Debug, Clone)]
pub struct SGD {
    lr: f32,
    momentum: f32,
    velocities: HashMap<String, ArrayD<f32>>,
}

impl SGD {
    /// Create a new SGD optimizer
    pub fn new(lr: f32, momentum: f32) -> Self {
        Self {
            lr,
            momentum,
            velocities: HashMap::new(),
        }
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }
}

impl Optimizer for SGD {
    fn step(&mut self, model: &mut Model) {
        for param in model.params_mut() {
            let Some(grad) = param.grad.as_ref() else {
                continue;
            };
            if grad.shape() != param.data.shape() {
                tracing::warn!(param = %param.name, "gradient shape differs from data, skipping");
                continue;
            }

            if self.momentum > 0.0 {
                // v = momentum * v - lr * grad
                let velocity = match self.velocities.remove(&param.name) {
                    Some(v) if v.shape() == grad.shape() => v * self.momentum - grad * self.lr,
                    _ => grad * (-self.lr),
                };
                param.data += &velocity;
                self.velocities.insert(param.name.clone(), velocity);
            } else {
                // param -= lr * grad
                param.data.scaled_add(-self.lr, grad);
            }
        }
    }

    fn lr(&self) -> f32 {
        self.lr
    }

    fn set_lr(&mut self, lr: f32) {
        self.lr = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Layer;
    use approx::assert_abs_diff_eq;
    use ndarray::arr1;

    fn model(weights: &[f32], grad: &[f32]) -> Model {
        let mut m = Model::new("m").with_layer(Layer::linear("fc", arr1(weights).into_dyn(), None));
        m.require_param_mut("fc.weight")
            .unwrap()
            .set_grad(arr1(grad).into_dyn());
        m
    }

    #[test]
    fn test_sgd_plain_step() {
        let mut m = model(&[1.0, 2.0], &[0.5, 1.0]);
        let mut opt = SGD::new(0.1, 0.0);
        opt.step(&mut m);
        let w = &m.param("fc.weight").unwrap().data;
        assert_abs_diff_eq!(w[[0]], 0.95, epsilon = 1e-6);
        assert_abs_diff_eq!(w[[1]], 1.9, epsilon = 1e-6);
    }

    #[test]
    fn test_sgd_momentum_accumulates() {
        let mut m = model(&[1.0], &[1.0]);
        let mut opt = SGD::new(0.1, 0.9);
        opt.step(&mut m);
        opt.step(&mut m);
        // v1 = -0.1, v2 = 0.9 * -0.1 - 0.1 = -0.19
        let w = &m.param("fc.weight").unwrap().data;
        assert_abs_diff_eq!(w[[0]], 1.0 - 0.1 - 0.19, epsilon = 1e-6);
    }

    #[test]
    fn test_sgd_skips_params_without_grad() {
        let mut m = Model::new("m").with_layer(Layer::linear("fc", arr1(&[1.0f32]).into_dyn(), None));
        let mut opt = SGD::new(0.1, 0.0);
        opt.step(&mut m);
        assert_eq!(m.param("fc.weight").unwrap().data[[0]], 1.0);
    }

    #[test]
    fn test_sgd_lr_accessors() {
        let mut opt = SGD::new(0.1, 0.5);
        opt.set_lr(0.02);
        assert_eq!(opt.lr(), 0.02);
        assert_eq!(opt.momentum(), 0.5);
    }
}
