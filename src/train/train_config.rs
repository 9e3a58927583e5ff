use std::sync::{Arc, atomic::{AtomicBool, Ordering}};

use serde::{Serialize, Deserialize};

use crate::data::batcher::check_batch_size;
use crate::{GanError, Result};

/// Configuration for a `train_loop` run.
///
/// # Fields
/// - `epochs`:           number of passes; each pass runs
///                       `floor(dataset_len / batch_size)` batches
/// - `batch_size`:       generator batch size; the discriminator sees
///                       `batch_size / 2` real plus as many fake images
/// - `generator_steps`:  composite updates per discriminator update
/// - `eval_every`:       evaluate after every N-th epoch; `0` disables
/// - `seed`:             seeds the training noise stream; entropy when `None`
/// - `stop_flag`:        optional atomic flag; when set to `true` from another
///                       thread the loop stops at the next batch boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub generator_steps: usize,
    pub eval_every: usize,
    pub seed: Option<u64>,
    #[serde(skip)]
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl TrainConfig {
    /// Creates a `TrainConfig` with one generator step, evaluation after
    /// every epoch, entropy-seeded noise and no stop flag.
    pub fn new(epochs: usize, batch_size: usize) -> Self {
        TrainConfig {
            epochs,
            batch_size,
            generator_steps: 1,
            eval_every: 1,
            seed: None,
            stop_flag: None,
        }
    }

    pub fn half_batch(&self) -> usize {
        self.batch_size / 2
    }

    /// Eager checks against the dataset the run will use.
    pub fn validate(&self, dataset_len: usize) -> Result<()> {
        check_batch_size(self.batch_size, dataset_len)?;
        if self.batch_size < 2 {
            return Err(GanError::InvalidBatchSize {
                batch_size: self.batch_size,
                dataset_size: dataset_len,
                reason: "batch size must be at least 2 so each half batch holds an image",
            });
        }
        if self.epochs == 0 {
            return Err(GanError::Config("epochs must be at least 1".to_owned()));
        }
        if self.generator_steps == 0 {
            return Err(GanError::Config("generator_steps must be at least 1".to_owned()));
        }
        Ok(())
    }

    /// True once `stop_flag` has been raised.
    pub fn stop_requested(&self) -> bool {
        self.stop_flag.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed))
    }

    /// Whether epoch `epoch` (0-based) ends with an evaluation.
    pub fn evaluates_after(&self, epoch: usize) -> bool {
        self.eval_every > 0 && (epoch + 1) % self.eval_every == 0
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig::new(10, 64)
    }
}
