//! Adam optimizer with bias-corrected moment estimates.

use crate::layers::dense::LayerGradients;
use crate::math::matrix::Matrix;
use crate::optim::{Optimizer, ParamGroup};
use crate::Result;

/// Adam optimizer
///
/// m_t = β1·m + (1-β1)·g,  v_t = β2·v + (1-β2)·g²
/// θ_t = θ - lr_t · m_t / (√v_t + ε),  lr_t = lr · √(1-β2^t) / (1-β1^t)
///
/// Moment buffers are created on the first step and are tied to the layer
/// order of the group the optimizer is used with, so each network gets its
/// own `Adam`.
pub struct Adam {
    lr: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
    t: u64,
    m: Vec<(Matrix, Matrix)>, // First moment (weights, biases)
    v: Vec<(Matrix, Matrix)>, // Second moment
}

impl Adam {
    pub fn new(lr: f64, beta1: f64, beta2: f64, epsilon: f64) -> Self {
        Self { lr, beta1, beta2, epsilon, t: 0, m: Vec::new(), v: Vec::new() }
    }

    pub fn default_params(lr: f64) -> Self {
        Self::new(lr, 0.9, 0.999, 1e-8)
    }

    fn ensure_moments(&mut self, grads: &[LayerGradients]) {
        if self.m.len() != grads.len() {
            let zeros = |g: &LayerGradients| (
                Matrix::zeros(g.weights.rows, g.weights.cols),
                Matrix::zeros(g.biases.rows, g.biases.cols),
            );
            self.m = grads.iter().map(zeros).collect();
            self.v = grads.iter().map(zeros).collect();
        }
    }
}

struct Moments {
    beta1: f64,
    beta2: f64,
    lr_t: f64,
    eps: f64,
}

impl Moments {
    fn apply(&self, param: &mut [f64], grad: &[f64], m: &mut [f64], v: &mut [f64]) {
        let moments = m.iter_mut().zip(v.iter_mut());
        for ((p, g), (m, v)) in param.iter_mut().zip(grad).zip(moments) {
            *m = self.beta1 * *m + (1.0 - self.beta1) * g;
            *v = self.beta2 * *v + (1.0 - self.beta2) * g * g;
            *p -= self.lr_t * *m / (v.sqrt() + self.eps);
        }
    }
}

impl Optimizer for Adam {
    fn update_parameters(&mut self, mut group: ParamGroup<'_>, grads: &[LayerGradients]) -> Result<()> {
        group.check(grads)?;
        self.ensure_moments(grads);
        self.t += 1;

        let t = self.t as i32;
        let step = Moments {
            beta1: self.beta1,
            beta2: self.beta2,
            lr_t: self.lr * (1.0 - self.beta2.powi(t)).sqrt() / (1.0 - self.beta1.powi(t)),
            eps: self.epsilon,
        };

        let moments = self.m.iter_mut().zip(self.v.iter_mut());
        for ((layer, g), (m, v)) in group.layers_mut().iter_mut().zip(grads).zip(moments) {
            step.apply(&mut layer.weights.data, &g.weights.data, &mut m.0.data, &mut v.0.data);
            step.apply(&mut layer.biases.data, &g.biases.data, &mut m.1.data, &mut v.1.data);
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.lr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ActivationFunction;
    use crate::layers::Layer;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn single_weight(w: f64) -> Vec<Layer> {
        let mut layer = Layer::new(1, 1, ActivationFunction::Identity, &mut StdRng::seed_from_u64(0));
        layer.weights.data[0] = w;
        vec![layer]
    }

    fn grad(w: f64) -> Vec<LayerGradients> {
        vec![LayerGradients {
            weights: Matrix::from_vec(1, 1, vec![w]),
            biases: Matrix::zeros(1, 1),
        }]
    }

    #[test]
    fn first_step_moves_by_learning_rate() {
        // With bias correction the first update is lr·sign(g), independent of |g|.
        let mut layers = single_weight(1.0);
        let mut adam = Adam::new(0.01, 0.5, 0.999, 1e-12);
        adam.update_parameters(ParamGroup::new("w", &mut layers), &grad(37.0)).unwrap();
        assert_abs_diff_eq!(layers[0].weights.data[0], 0.99, epsilon = 1e-9);
        assert_eq!(adam.t, 1);
    }

    proptest! {
        #[test]
        fn prop_adam_converges_on_quadratic(start in -5.0f64..5.0, lr in 0.05f64..0.3) {
            // f(w) = w², ∂f/∂w = 2w
            let mut layers = single_weight(start);
            let mut adam = Adam::default_params(lr);
            for _ in 0..500 {
                let w = layers[0].weights.data[0];
                adam.update_parameters(ParamGroup::new("w", &mut layers), &grad(2.0 * w)).unwrap();
            }
            prop_assert!(layers[0].weights.data[0].abs() < 0.5);
        }
    }
}
