//! Turns generated samples from an `EpochReport` into image files.
//!
//! Pixels are mapped from the given `PixelRange` to 0..=255 and clamped, so
//! slightly out-of-range generator output still renders.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

use crate::data::{ImageShape, NoiseSampler, PixelRange};
use crate::gan::models::Generator;
use crate::train::report::EpochReport;
use crate::{GanError, Result};

fn to_byte(x: f64, range: PixelRange) -> u8 {
    let (lo, hi) = range.bounds();
    (((x - lo) / (hi - lo)).clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Builds a grayscale (1 channel) or RGB (3 channel) image from one
/// flattened `H x W x C` sample.
pub fn sample_to_image(sample: &[f64], shape: ImageShape, range: PixelRange) -> Result<DynamicImage> {
    if sample.len() != shape.len() {
        return Err(GanError::ShapeMismatch(format!(
            "sample has {} values but {:?} needs {}",
            sample.len(), shape.dims(), shape.len()
        )));
    }
    let (w, h) = (shape.width as u32, shape.height as u32);
    let at = |x: u32, y: u32, c: usize| {
        sample[(y as usize * shape.width + x as usize) * shape.channels + c]
    };

    match shape.channels {
        1 => Ok(DynamicImage::ImageLuma8(GrayImage::from_fn(w, h, |x, y| {
            Luma([to_byte(at(x, y, 0), range)])
        }))),
        3 => Ok(DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            Rgb([0, 1, 2].map(|c| to_byte(at(x, y, c), range)))
        }))),
        n => Err(GanError::ShapeMismatch(format!(
            "only 1- or 3-channel samples can be rendered, got {n} channels"
        ))),
    }
}

/// Writes every sample of `report` as `epoch_<n>_sample_<i>.png` under `dir`
/// (1-based epoch, as shown to users) and returns the paths written.
pub fn save_samples(report: &EpochReport, range: PixelRange, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    report.samples.iter().enumerate()
        .map(|(i, sample)| {
            let path = dir.join(format!("epoch_{:03}_sample_{}.png", report.epoch + 1, i));
            sample_to_image(sample, report.sample_shape, range)?.save(&path)?;
            Ok(path)
        })
        .collect()
}

/// Draws `count` fresh images from `generator` and writes them as
/// `generated_<i>.png` under `dir`.
pub fn save_generated<G: Generator>(
    generator: &G,
    count: usize,
    noise: &mut NoiseSampler,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let shape = generator.output_shape();
    let range = generator.output_range().unwrap_or(PixelRange::Unit);
    let latent = noise.sample_latent(count, &generator.latent_shape())?;
    let images = generator.predict(&latent)?;

    std::fs::create_dir_all(dir)?;
    (0..count)
        .map(|i| {
            let path = dir.join(format!("generated_{i}.png"));
            sample_to_image(images.row(i), shape, range)?.save(&path)?;
            Ok(path)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gan::models::BatchMetrics;
    use crate::gan::{Gan, ModelSpec};

    #[test]
    fn maps_symmetric_range_to_bytes() {
        let shape = ImageShape::new(1, 3, 1);
        let img = sample_to_image(&[-1.0, 0.0, 1.5], shape, PixelRange::Symmetric).unwrap().to_luma8();
        assert_eq!(img.as_raw(), &vec![0, 128, 255]);
    }

    #[test]
    fn rejects_two_channel_samples() {
        let shape = ImageShape::new(1, 1, 2);
        assert!(sample_to_image(&[0.0, 0.0], shape, PixelRange::Unit).is_err());
    }

    #[test]
    fn writes_one_png_per_sample() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = BatchMetrics { loss: 0.5, accuracy: 1.0 };
        let report = EpochReport {
            epoch: 0,
            real: metrics,
            fake: metrics,
            sample_shape: ImageShape::new(2, 2, 1),
            samples: vec![vec![0.0, 0.25, 0.5, 1.0]; 2],
        };
        let paths = save_samples(&report, PixelRange::Unit, dir.path()).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.exists()));
        assert!(paths[1].ends_with("epoch_001_sample_1.png"));
    }

    #[test]
    fn generated_images_match_the_generator_shape() {
        let dir = tempfile::tempdir().unwrap();
        let gan = Gan::build(&ModelSpec::default(), 1).unwrap();
        let paths = save_generated(&gan.generator, 3, &mut NoiseSampler::seeded(5), dir.path()).unwrap();
        assert_eq!(paths.len(), 3);
        let img = image::open(&paths[2]).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (28, 28));
    }

    #[test]
    fn zero_generated_images_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let gan = Gan::build(&ModelSpec::default(), 1).unwrap();
        assert!(save_generated(&gan.generator, 0, &mut NoiseSampler::seeded(5), dir.path()).is_err());
    }
}
