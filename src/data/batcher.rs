//! Deterministic, cyclic batching of real samples plus the label tensors
//! used on each side of the adversarial game.

use crate::data::dataset::Dataset;
use crate::math::matrix::Matrix;
use crate::{GanError, Result};

/// Real images with their all-ones labels.
#[derive(Debug, Clone)]
pub struct RealBatch {
    /// Index of the first dataset row in this batch.
    pub start: usize,
    pub images: Matrix,
    /// Shape `[batch_size, 1]`, all 1.0.
    pub labels: Matrix,
}

/// Caller-owned batcher state.
///
/// Each call to [`BatchCursor::next_real_batch`] returns the slice at the
/// current position and then advances by one modulo
/// `floor(dataset_len / batch_size)`, so every slice is visited once before
/// any repeats. Separate training runs keep separate cursors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchCursor {
    batch: usize,
}

impl BatchCursor {
    pub fn new() -> BatchCursor {
        BatchCursor::default()
    }

    /// A cursor positioned at `batch` (reduced modulo the cycle length on use).
    pub fn at(batch: usize) -> BatchCursor {
        BatchCursor { batch }
    }

    pub fn position(&self) -> usize {
        self.batch
    }

    pub fn next_real_batch(&mut self, dataset: &Dataset, batch_size: usize) -> Result<RealBatch> {
        let n = dataset.len();
        check_batch_size(batch_size, n)?;

        let per_epoch = batches_per_epoch(n, batch_size);
        let slot = self.batch % per_epoch;
        let start = (slot * batch_size).min(n - batch_size);
        self.batch = (slot + 1) % per_epoch;

        Ok(RealBatch {
            start,
            images: dataset.slice(start, batch_size),
            labels: real_labels(batch_size),
        })
    }
}

/// `floor(dataset_len / batch_size)`; zero when the batch size is zero.
pub fn batches_per_epoch(dataset_len: usize, batch_size: usize) -> usize {
    dataset_len.checked_div(batch_size).unwrap_or(0)
}

/// Fails unless `0 < batch_size <= dataset_len`.
pub fn check_batch_size(batch_size: usize, dataset_len: usize) -> Result<()> {
    let reason = if batch_size == 0 {
        "batch size must be positive"
    } else if batch_size > dataset_len {
        "batch size exceeds the dataset size"
    } else {
        return Ok(());
    };
    Err(GanError::InvalidBatchSize { batch_size, dataset_size: dataset_len, reason })
}

/// `[n, 1]` of 1.0: real images, as the discriminator should see them.
pub fn real_labels(n: usize) -> Matrix {
    Matrix::filled(n, 1, 1.0)
}

/// `[n, 1]` of 0.0: generator output while training the discriminator.
pub fn fake_labels(n: usize) -> Matrix {
    Matrix::zeros(n, 1)
}

/// `[n, 1]` of 1.0: generator output labelled "real" while training the
/// generator through the composite model.
pub fn inverted_labels(n: usize) -> Matrix {
    Matrix::filled(n, 1, 1.0)
}
