use crate::math::matrix::Matrix;

pub struct BceLoss;

const EPS: f64 = 1e-12;

impl BceLoss {
    /// Scalar BCE: -mean(y·log(p+ε) + (1-y)·log(1-p+ε))
    pub fn loss(predicted: &Matrix, expected: &Matrix) -> f64 {
        let n = predicted.data.len() as f64;
        predicted.data.iter().zip(&expected.data)
            .map(|(p, y)| -(y * (p + EPS).ln() + (1.0 - y) * (1.0 - p + EPS).ln()))
            .sum::<f64>() / n
    }

    /// Gradient of the mean loss: (p - y) / ((p + ε) · (1 - p + ε) · n)
    pub fn derivative(predicted: &Matrix, expected: &Matrix) -> Matrix {
        let n = predicted.data.len() as f64;
        let data = predicted.data.iter().zip(&expected.data)
            .map(|(p, y)| (p - y) / ((p + EPS) * (1.0 - p + EPS) * n))
            .collect();
        Matrix::from_vec(predicted.rows, predicted.cols, data)
    }

    /// Fraction of predictions on the same side of 0.5 as their label.
    pub fn accuracy(predicted: &Matrix, expected: &Matrix) -> f64 {
        let n = predicted.data.len();
        if n == 0 {
            return 0.0;
        }
        let correct = predicted.data.iter().zip(&expected.data)
            .filter(|(p, y)| (**p > 0.5) == (**y > 0.5))
            .count();
        correct as f64 / n as f64
    }
}
