pub mod dataset;
pub mod batcher;
pub mod noise;
pub mod synthetic;

pub use dataset::{Dataset, ImageShape, PixelRange};
pub use batcher::{batches_per_epoch, fake_labels, inverted_labels, real_labels, BatchCursor, RealBatch};
pub use noise::{LatentShape, NoiseSampler};
