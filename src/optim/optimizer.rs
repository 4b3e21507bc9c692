//! Optimizer trait

use crate::model::Model;

/// Trait for optimization algorithms driven by a modifier schedule
pub trait Optimizer: Send {
    /// Perform a single optimization step over every parameter with a gradient
    fn step(&mut self, model: &mut Model);

    /// Zero out all gradients
    fn zero_grad(&mut self, model: &mut Model) {
        model.zero_grad();
    }

    /// Get learning rate
    fn lr(&self) -> f32;

    /// Set learning rate
    fn set_lr(&mut self, lr: f32);
}

/// Optimizer that only tracks a learning rate.
///
/// Used to replay a recipe over a model without training it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoopOptimizer {
    lr: f32,
}

impl NoopOptimizer {
    pub fn new(lr: f32) -> Self {
        Self { lr }
    }
}

impl Default for NoopOptimizer {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Optimizer for NoopOptimizer {
    fn step(&mut self, _model: &mut Model) {}

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
    use ndarray::arr2;

    /// Minimal optimizer implementation for testing default trait methods
    struct TestOptimizer {
        learning_rate: f32,
    }

    impl Optimizer for TestOptimizer {
        fn step(&mut self, model: &mut Model) {
            let lr = self.learning_rate;
            for param in model.params_mut() {
                if let Some(grad) = param.grad.clone() {
                    param.data.scaled_add(-lr, &grad);
                }
            }
        }

        fn lr(&self) -> f32 {
            self.learning_rate
        }

        fn set_lr(&mut self, lr: f32) {
            self.learning_rate = lr;
        }
    }

    fn model_with_grad() -> Model {
        let mut model =
            Model::new("m").with_layer(Layer::linear("fc", arr2(&[[1.0f32, 2.0]]).into_dyn(), None));
        model
            .require_param_mut("fc.weight")
            .unwrap()
            .set_grad(arr2(&[[0.5f32, 1.0]]).into_dyn());
        model
    }

    #[test]
    fn test_optimizer_zero_grad_default() {
        let mut opt = TestOptimizer { learning_rate: 0.1 };
        let mut model = model_with_grad();
        opt.zero_grad(&mut model);
        let grad = model.param("fc.weight").unwrap().grad.as_ref().unwrap();
        assert!(grad.iter().all(|g| *g == 0.0));
    }

    #[test]
    fn test_optimizer_set_lr() {
        let mut opt = TestOptimizer { learning_rate: 0.1 };
        opt.set_lr(0.01);
        assert_eq!(opt.lr(), 0.01);
    }

    #[test]
    fn test_noop_leaves_model_untouched() {
        let mut opt = NoopOptimizer::new(0.3);
        let mut model = model_with_grad();
        let before = model.clone();
        opt.step(&mut model);
        assert_eq!(model, before);
        assert_eq!(opt.lr(), 0.3);
        opt.set_lr(0.7);
        assert_eq!(opt.lr(), 0.7);
    }
}
