use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::data::batcher::check_batch_size;
use crate::data::{fake_labels, BatchCursor, Dataset, NoiseSampler};
use crate::gan::models::{Discriminator, Generator};
use crate::train::report::EpochReport;
use crate::Result;

/// Epoch-level discriminator scoring.
///
/// Reads the models only. Two calls with the same epoch and unchanged models
/// return identical reports: the real batch is taken from a cursor placed at
/// `epoch` and the noise is seeded from `seed + epoch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Evaluator {
    /// Real and fake images scored per evaluation; clamped to the dataset size.
    pub batch_size: usize,
    /// Generated images copied into the report for display.
    pub sample_count: usize,
    pub seed: u64,
}

impl Default for Evaluator {
    fn default() -> Self {
        Evaluator { batch_size: 100, sample_count: 1, seed: 0 }
    }
}

impl Evaluator {
    /// Fails with `InvalidBatchSize` if no image would be scored on a dataset
    /// of `dataset_len` images.
    pub fn validate(&self, dataset_len: usize) -> Result<()> {
        check_batch_size(self.batch_size.min(dataset_len), dataset_len)
    }

    pub fn evaluate_epoch<G, D>(&self, epoch: usize, generator: &G, discriminator: &D, dataset: &Dataset) -> Result<EpochReport>
    where
        G: Generator,
        D: Discriminator,
    {
        let n = self.batch_size.min(dataset.len());

        let real_batch = BatchCursor::at(epoch).next_real_batch(dataset, n)?;
        let real = discriminator.evaluate(&real_batch.images, &real_batch.labels)?;

        let mut noise = NoiseSampler::seeded(self.seed.wrapping_add(epoch as u64));
        let latent = noise.sample_latent(n, &generator.latent_shape())?;
        let fakes = generator.predict(&latent)?;
        let fake = discriminator.evaluate(&fakes, &fake_labels(n))?;

        debug!(epoch, real_start = real_batch.start, batch = n, "evaluated discriminator");

        let samples = (0..self.sample_count.min(n))
            .map(|i| fakes.row(i).to_vec())
            .collect();

        Ok(EpochReport {
            epoch,
            real,
            fake,
            sample_shape: generator.output_shape(),
            samples,
        })
    }
}
