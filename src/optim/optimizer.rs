//! Optimizer trait and the parameter-group handle it updates.

use serde::{Serialize, Deserialize};

use crate::layers::dense::{Layer, LayerGradients};
use crate::optim::{Adam, Sgd};
use crate::{GanError, Result};

/// Exclusive handle on the parameters an optimizer step may change.
///
/// Built from `&mut Network` (see `Network::param_group`), so code that only
/// holds a shared reference to a network has no way to update it.
pub struct ParamGroup<'a> {
    name: &'a str,
    layers: &'a mut [Layer],
}

impl<'a> ParamGroup<'a> {
    pub fn new(name: &'a str, layers: &'a mut [Layer]) -> Self {
        ParamGroup { name, layers }
    }

    pub fn layers_mut(&mut self) -> &mut [Layer] {
        self.layers
    }

    /// Checks that `grads` has one entry per layer with matching shapes.
    pub fn check(&self, grads: &[LayerGradients]) -> Result<()> {
        if grads.len() != self.layers.len() {
            return Err(GanError::ShapeMismatch(format!(
                "parameter group '{}' has {} layers but {} gradients were supplied",
                self.name, self.layers.len(), grads.len()
            )));
        }
        for (i, (layer, g)) in self.layers.iter().zip(grads).enumerate() {
            if !layer.weights.same_shape(&g.weights) || !layer.biases.same_shape(&g.biases) {
                return Err(GanError::ShapeMismatch(format!(
                    "gradient for layer {} of '{}' does not match its parameters",
                    i, self.name
                )));
            }
        }
        Ok(())
    }
}

/// Trait for optimization algorithms
pub trait Optimizer: Send {
    /// Applies one update to every parameter in `group`.
    fn update_parameters(&mut self, group: ParamGroup<'_>, grads: &[LayerGradients]) -> Result<()>;

    fn learning_rate(&self) -> f64;
}

/// Serializable optimizer choice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerSpec {
    Sgd { learning_rate: f64 },
    Adam { learning_rate: f64, beta1: f64, beta2: f64, epsilon: f64 },
}

impl OptimizerSpec {
    /// Adam with lr = 0.0002 and β1 = 0.5, the usual DCGAN setting.
    pub fn gan_adam() -> OptimizerSpec {
        OptimizerSpec::Adam { learning_rate: 0.0002, beta1: 0.5, beta2: 0.999, epsilon: 1e-7 }
    }

    pub fn build(&self) -> Box<dyn Optimizer> {
        match *self {
            OptimizerSpec::Sgd { learning_rate } => Box::new(Sgd::new(learning_rate)),
            OptimizerSpec::Adam { learning_rate, beta1, beta2, epsilon } => {
                Box::new(Adam::new(learning_rate, beta1, beta2, epsilon))
            }
        }
    }
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        OptimizerSpec::gan_adam()
    }
}
