use crate::layers::dense::LayerGradients;
use crate::optim::{Optimizer, ParamGroup};
use crate::Result;

pub struct Sgd {
    pub learning_rate: f64,
}

impl Sgd {
    pub fn new(learning_rate: f64) -> Sgd {
        Sgd { learning_rate }
    }
}

impl Optimizer for Sgd {
    fn update_parameters(&mut self, mut group: ParamGroup<'_>, grads: &[LayerGradients]) -> Result<()> {
        group.check(grads)?;
        let lr = self.learning_rate;
        for (layer, g) in group.layers_mut().iter_mut().zip(grads) {
            for (w, dw) in layer.weights.data.iter_mut().zip(&g.weights.data) {
                *w -= lr * dw;
            }
            for (b, db) in layer.biases.data.iter_mut().zip(&g.biases.data) {
                *b -= lr * db;
            }
        }
        Ok(())
    }

    fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}
