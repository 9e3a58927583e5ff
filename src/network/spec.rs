use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::activation::ActivationFunction;
use crate::network::network::Network;
use crate::Result;

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`:        number of neurons in this layer
/// - `input_size`:  number of neurons feeding into this layer (i.e. the output
///                  size of the previous layer, or the raw input dimension for
///                  the first layer)
/// - `activation`:  activation function applied after the linear transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

impl LayerSpec {
    pub fn new(size: usize, input_size: usize, activation: ActivationFunction) -> LayerSpec {
        LayerSpec { size, input_size, activation }
    }
}

/// A serializable description of a network architecture.
///
/// Generator and discriminator are both described this way in `GanConfig`,
/// so an architecture can be changed in JSON without touching code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name, used in logs.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    /// Chains layer sizes: `sizes[0]` is the input width, each following
    /// entry is paired with the activation at the same position in
    /// `activations` (one fewer than `sizes`).
    pub fn chain(name: &str, sizes: &[usize], activations: &[ActivationFunction]) -> NetworkSpec {
        let layers = sizes.windows(2).zip(activations)
            .map(|(pair, &act)| LayerSpec::new(pair[1], pair[0], act))
            .collect();
        NetworkSpec { name: name.to_owned(), layers }
    }

    /// Initializes a network with fresh weights drawn from `rng`.
    pub fn build<R: Rng>(&self, rng: &mut R) -> Result<Network> {
        Network::new(
            self.layers.iter().map(|l| (l.size, l.input_size, l.activation)).collect(),
            rng,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GanError;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn chain_links_consecutive_sizes() {
        let spec = NetworkSpec::chain(
            "d",
            &[784, 128, 1],
            &[ActivationFunction::LeakyReLU { alpha: 0.2 }, ActivationFunction::Sigmoid],
        );
        assert_eq!(spec.layers[1], LayerSpec::new(1, 128, ActivationFunction::Sigmoid));
        assert_eq!(spec.layers[0], LayerSpec::new(128, 784, ActivationFunction::LeakyReLU { alpha: 0.2 }));
    }

    #[test]
    fn build_propagates_chain_errors() {
        let spec = NetworkSpec {
            name: "broken".to_owned(),
            layers: vec![
                LayerSpec::new(8, 4, ActivationFunction::ReLU),
                LayerSpec::new(1, 9, ActivationFunction::Sigmoid),
            ],
        };
        let err = spec.build(&mut StdRng::seed_from_u64(1)).unwrap_err();
        assert!(matches!(err, GanError::ShapeMismatch(_)));
    }

    #[test]
    fn round_trips_through_json() {
        let spec = NetworkSpec::chain("g", &[2, 3], &[ActivationFunction::Tanh]);
        let json = serde_json::to_string(&spec).unwrap();
        let back: NetworkSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, spec);
    }
}
