use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{math::matrix::Matrix, activation::activation::ActivationFunction};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub input_size: usize,
    /// Shape: (input_size, size).
    pub weights: Matrix,
    /// Shape: (1, size).
    pub biases: Matrix,
    pub activator: ActivationFunction,
}

/// Values a forward pass leaves behind for the backward pass.
///
/// Kept outside the layer so that inference and backprop through frozen
/// parameters only need `&Layer`.
#[derive(Debug, Clone)]
pub struct LayerCache {
    pub input: Matrix,
    /// Pre-activation values (z = xW + b) needed for the activation derivative.
    pub pre_activation: Matrix,
}

/// Gradients of the loss with respect to one layer's parameters.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl Layer {
    pub fn new<R: Rng>(size: usize, input_size: usize, activation: ActivationFunction, rng: &mut R) -> Layer {
        let weights = if activation.prefers_he_init() {
            Matrix::he(input_size, size, rng)
        } else {
            Matrix::xavier(input_size, size, rng)
        };

        Layer {
            size,
            input_size,
            weights,
            biases: Matrix::zeros(1, size),
            activator: activation,
        }
    }

    fn pre_activation(&self, input: &Matrix) -> Matrix {
        (input * &self.weights).add_row(&self.biases)
    }

    /// Inference only.
    pub fn infer(&self, input: &Matrix) -> Matrix {
        self.activator.apply(&self.pre_activation(input))
    }

    /// Forward pass over a batch, returning the activations and the cache
    /// `backward` needs.
    pub fn forward(&self, input: &Matrix) -> (Matrix, LayerCache) {
        let z = self.pre_activation(input);
        let a = self.activator.apply(&z);
        let cache = LayerCache { input: input.clone(), pre_activation: z };
        (a, cache)
    }

    /// `delta` is ∂L/∂a for this layer's output batch.
    /// Returns the parameter gradients and ∂L/∂x for the layer input.
    pub fn backward(&self, cache: &LayerCache, delta: &Matrix) -> (LayerGradients, Matrix) {
        let layer_delta = self.local_delta(cache, delta);
        let grads = LayerGradients {
            weights: &cache.input.transpose() * &layer_delta,
            biases: layer_delta.sum_rows(),
        };
        let input_delta = &layer_delta * &self.weights.transpose();
        (grads, input_delta)
    }

    /// Like `backward` but skips the parameter gradients.
    pub fn input_delta(&self, cache: &LayerCache, delta: &Matrix) -> Matrix {
        &self.local_delta(cache, delta) * &self.weights.transpose()
    }

    // δ = error ⊙ σ'(z)
    fn local_delta(&self, cache: &LayerCache, delta: &Matrix) -> Matrix {
        delta.hadamard(&self.activator.derivative_of(&cache.pre_activation))
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.data.len() + self.biases.data.len()
    }
}
