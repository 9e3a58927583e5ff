use serde::{Serialize, Deserialize};

use crate::data::PixelRange;
use crate::math::matrix::Matrix;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActivationFunction {
    Sigmoid,
    ReLU,
    Identity,
    Tanh,
    LeakyReLU { alpha: f64 },
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::Identity => x,
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
        }
    }

    /// Derivative with respect to the pre-activation `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => {
                let fx = self.function(x);
                fx * (1.0 - fx)
            }
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
        }
    }

    pub fn apply(&self, z: &Matrix) -> Matrix {
        z.map(|x| self.function(x))
    }

    pub fn derivative_of(&self, z: &Matrix) -> Matrix {
        z.map(|x| self.derivative(x))
    }

    /// Output range when this activation ends an image-producing network.
    /// `None` for unbounded activations.
    pub fn output_range(&self) -> Option<PixelRange> {
        match self {
            ActivationFunction::Sigmoid => Some(PixelRange::Unit),
            ActivationFunction::Tanh => Some(PixelRange::Symmetric),
            _ => None,
        }
    }

    /// He initialization suits the ReLU family; everything else gets Xavier.
    pub fn prefers_he_init(&self) -> bool {
        matches!(self, ActivationFunction::ReLU | ActivationFunction::LeakyReLU { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn leaky_relu_keeps_a_slope_below_zero() {
        let act = ActivationFunction::LeakyReLU { alpha: 0.2 };
        assert_abs_diff_eq!(act.function(-2.0), -0.4);
        assert_abs_diff_eq!(act.derivative(-2.0), 0.2);
        assert_abs_diff_eq!(act.function(3.0), 3.0);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let h = 1e-6;
        for act in [
            ActivationFunction::Sigmoid,
            ActivationFunction::Tanh,
            ActivationFunction::LeakyReLU { alpha: 0.2 },
        ] {
            for &x in &[-1.3, 0.4, 2.1] {
                let numeric = (act.function(x + h) - act.function(x - h)) / (2.0 * h);
                assert_abs_diff_eq!(act.derivative(x), numeric, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn bounded_activations_report_their_range() {
        assert_eq!(ActivationFunction::Sigmoid.output_range(), Some(PixelRange::Unit));
        assert_eq!(ActivationFunction::Tanh.output_range(), Some(PixelRange::Symmetric));
        assert_eq!(ActivationFunction::ReLU.output_range(), None);
    }

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_string(&ActivationFunction::LeakyReLU { alpha: 0.2 }).unwrap();
        assert_eq!(json, r#"{"type":"LeakyReLU","alpha":0.2}"#);
    }
}
