use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::{
    activation::activation::ActivationFunction,
    layers::dense::{Layer, LayerCache, LayerGradients},
    math::matrix::Matrix,
    optim::ParamGroup,
    GanError, Result,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub layers: Vec<Layer>,
}

/// Per-layer caches of one forward pass plus its output.
#[derive(Debug, Clone)]
pub struct ForwardTrace {
    caches: Vec<LayerCache>,
    pub output: Matrix,
}

impl Network {
    /// Builds a network from (size, input_size, activation) tuples.
    ///
    /// Fails with `ShapeMismatch` if a layer's `input_size` differs from the
    /// previous layer's `size`.
    pub fn new<R: Rng>(layer_specs: Vec<(usize, usize, ActivationFunction)>, rng: &mut R) -> Result<Network> {
        if layer_specs.is_empty() {
            return Err(GanError::Config("a network needs at least one layer".to_owned()));
        }
        for (i, pair) in layer_specs.windows(2).enumerate() {
            let (prev_size, _, _) = pair[0];
            let (_, input_size, _) = pair[1];
            if prev_size != input_size {
                return Err(GanError::ShapeMismatch(format!(
                    "layer {} expects {} inputs but layer {} produces {}",
                    i + 1, input_size, i, prev_size
                )));
            }
        }
        if let Some(&(size, input_size, _)) = layer_specs.iter().find(|(s, i, _)| *s == 0 || *i == 0) {
            return Err(GanError::InvalidShape(vec![input_size, size]));
        }

        let layers = layer_specs.into_iter()
            .map(|(size, input_size, activation)| Layer::new(size, input_size, activation, rng))
            .collect();
        Ok(Network { layers })
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, |l| l.input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, |l| l.size)
    }

    pub fn output_activation(&self) -> Option<ActivationFunction> {
        self.layers.last().map(|l| l.activator)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// Inference pass; nothing is retained.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        self.check_input(input)?;
        Ok(self.layers.iter().fold(input.clone(), |x, layer| layer.infer(&x)))
    }

    /// Forward pass that records what the backward pass needs.
    pub fn forward(&self, input: &Matrix) -> Result<ForwardTrace> {
        self.check_input(input)?;
        let mut caches = Vec::with_capacity(self.layers.len());
        let mut current = input.clone();
        for layer in &self.layers {
            let (a, cache) = layer.forward(&current);
            caches.push(cache);
            current = a;
        }
        Ok(ForwardTrace { caches, output: current })
    }

    /// Backpropagates `delta` (∂L/∂output) through the whole stack.
    /// Returns per-layer gradients in layer order and ∂L/∂input.
    pub fn backward(&self, trace: &ForwardTrace, delta: &Matrix) -> (Vec<LayerGradients>, Matrix) {
        let mut grads = Vec::with_capacity(self.layers.len());
        let mut delta = delta.clone();
        for (layer, cache) in self.layers.iter().zip(&trace.caches).rev() {
            let (g, input_delta) = layer.backward(cache, &delta);
            grads.push(g);
            delta = input_delta;
        }
        grads.reverse();
        (grads, delta)
    }

    /// ∂L/∂input without parameter gradients, for a network whose parameters
    /// are not being updated.
    pub fn input_gradient(&self, trace: &ForwardTrace, delta: &Matrix) -> Matrix {
        self.layers.iter().zip(&trace.caches).rev()
            .fold(delta.clone(), |d, (layer, cache)| layer.input_delta(cache, &d))
    }

    /// Hands this network's parameters to an optimizer.
    pub fn param_group<'a>(&'a mut self, name: &'a str) -> ParamGroup<'a> {
        ParamGroup::new(name, &mut self.layers)
    }

    fn check_input(&self, input: &Matrix) -> Result<()> {
        if input.cols != self.input_size() {
            return Err(GanError::ShapeMismatch(format!(
                "network expects {} input values per row, got {}",
                self.input_size(), input.cols
            )));
        }
        Ok(())
    }
}
