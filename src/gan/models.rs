//! Contracts the training loop needs from the three models.
//!
//! Trainability is carried by the borrow each call takes: the discriminator
//! updates itself only through `Discriminator::train_on_batch(&mut self, ..)`,
//! while `Composite::train_on_batch` receives the discriminator as `&D` and so
//! cannot change its parameters.

use serde::{Serialize, Deserialize};

use crate::data::{Dataset, ImageShape, LatentShape, PixelRange};
use crate::math::matrix::Matrix;
use crate::{GanError, Result};

/// Loss and accuracy of one scored batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchMetrics {
    pub loss: f64,
    pub accuracy: f64,
}

pub trait Generator {
    fn latent_shape(&self) -> LatentShape;

    fn output_shape(&self) -> ImageShape;

    /// Range the output activation confines images to, when known.
    fn output_range(&self) -> Option<PixelRange> {
        None
    }

    /// Inference: one image per latent row.
    fn predict(&self, latent: &Matrix) -> Result<Matrix>;
}

pub trait Discriminator {
    fn input_shape(&self) -> ImageShape;

    /// One supervised update on `images` (labels shaped `[rows, 1]`).
    fn train_on_batch(&mut self, images: &Matrix, labels: &Matrix) -> Result<BatchMetrics>;

    /// Scores a batch without touching parameters.
    fn evaluate(&self, images: &Matrix, labels: &Matrix) -> Result<BatchMetrics>;
}

/// Generator stacked on a frozen discriminator, used to push the
/// discriminator's gradient into the generator's parameters.
pub trait Composite<G, D> {
    /// Updates `generator` only and returns the composite loss.
    fn train_on_batch(&mut self, generator: &mut G, discriminator: &D, latent: &Matrix, labels: &Matrix) -> Result<f64>;
}

/// Setup-time check that generator, discriminator and dataset agree on the
/// image shape and that the generator output range matches the dataset pixels.
pub fn validate_pairing<G: Generator, D: Discriminator>(generator: &G, discriminator: &D, dataset: &Dataset) -> Result<()> {
    let produced = generator.output_shape();
    let expected = discriminator.input_shape();
    if produced != expected {
        return Err(GanError::ShapeMismatch(format!(
            "generator produces {:?} images but the discriminator expects {:?}",
            produced.dims(), expected.dims()
        )));
    }
    if dataset.shape() != expected {
        return Err(GanError::ShapeMismatch(format!(
            "dataset holds {:?} images but the discriminator expects {:?}",
            dataset.shape().dims(), expected.dims()
        )));
    }
    if let Some(range) = generator.output_range() {
        let pixels = dataset.pixel_range();
        if pixels != Some(range) {
            return Err(GanError::RangeMismatch(format!(
                "generator output is confined to {:?} but dataset pixels span {}",
                range.bounds(),
                pixels.map_or("neither [0, 1] nor [-1, 1]".to_owned(), |p| format!("{:?}", p.bounds()))
            )));
        }
    }
    Ok(())
}

/// Rejects NaN and infinite losses reported by `stage`.
pub fn ensure_finite(stage: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(GanError::NonFiniteLoss { stage, value })
    }
}
