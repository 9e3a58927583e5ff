use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Serialize, Deserialize};

use crate::data::dataset::ImageShape;
use crate::math::matrix::Matrix;
use crate::{GanError, Result};

/// What the generator consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LatentShape {
    /// `[batch, dim]` latent vectors.
    Vector { dim: usize },
    /// `[batch, H, W, C]` noise images, for image-to-image generators.
    Image { shape: ImageShape },
}

impl LatentShape {
    /// Values per sample.
    pub fn len(&self) -> usize {
        match self {
            LatentShape::Vector { dim } => *dim,
            LatentShape::Image { shape } => shape.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full tensor shape for `batch` samples.
    pub fn batch_shape(&self, batch: usize) -> Vec<usize> {
        match self {
            LatentShape::Vector { dim } => vec![batch, *dim],
            LatentShape::Image { shape } => vec![batch, shape.height, shape.width, shape.channels],
        }
    }
}

impl Default for LatentShape {
    fn default() -> Self {
        LatentShape::Vector { dim: 100 }
    }
}

/// Standard-normal noise source. The only state is the RNG stream.
pub struct NoiseSampler {
    rng: StdRng,
}

impl NoiseSampler {
    pub fn seeded(seed: u64) -> NoiseSampler {
        NoiseSampler { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> NoiseSampler {
        NoiseSampler { rng: StdRng::from_entropy() }
    }

    /// Draws independent N(0, 1) values for a tensor of `shape`.
    ///
    /// The first dimension is the batch (matrix rows); the rest are flattened
    /// into columns. Every dimension must be positive.
    pub fn sample(&mut self, shape: &[usize]) -> Result<Matrix> {
        if shape.is_empty() || shape.contains(&0) {
            return Err(GanError::InvalidShape(shape.to_vec()));
        }
        let rows = shape[0];
        let cols: usize = shape[1..].iter().product();
        let data = (0..rows * cols).map(|_| self.rng.sample(StandardNormal)).collect();
        Ok(Matrix::from_vec(rows, cols, data))
    }

    pub fn sample_latent(&mut self, batch: usize, latent: &LatentShape) -> Result<Matrix> {
        self.sample(&latent.batch_shape(batch))
    }
}
