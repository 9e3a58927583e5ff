//! ferrite-gan: adversarial training of a dense generator against a dense
//! discriminator, built on the from-scratch matrix and layer code in this
//! crate.
//!
//! The core is [`train::train_loop`]. It alternates a discriminator update on
//! a mixed real/fake batch with one or more generator updates through the
//! composite model, reports every batch and evaluates at epoch boundaries.
//! Generator, discriminator and composite are reached through the traits in
//! [`gan::models`], so the loop runs equally well against the dense networks
//! in [`gan::dense`] or any other implementation.

pub mod math;
pub mod activation;
pub mod layers;
pub mod network;
pub mod loss;
pub mod optim;
pub mod data;
pub mod gan;
pub mod train;
pub mod config;

// Convenience re-exports
pub use math::matrix::Matrix;
pub use activation::activation::ActivationFunction;
pub use layers::dense::Layer;
pub use network::network::Network;
pub use loss::bce::BceLoss;
pub use optim::{Adam, Optimizer, ParamGroup, Sgd};
pub use data::{BatchCursor, Dataset, ImageShape, LatentShape, NoiseSampler};
pub use gan::{Composite, Discriminator, Gan, Generator};
pub use train::{train_loop, Evaluator, TrainConfig};
pub use config::GanConfig;

/// Library error types
#[derive(Debug, thiserror::Error)]
pub enum GanError {
    #[error("invalid batch size {batch_size} for a dataset of {dataset_size} images: {reason}")]
    InvalidBatchSize {
        batch_size: usize,
        dataset_size: usize,
        reason: &'static str,
    },

    #[error("training step failed at epoch {epoch}, batch {batch}: {source}")]
    TrainingStep {
        epoch: usize,
        batch: usize,
        #[source]
        source: Box<GanError>,
    },

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid shape {0:?}: every dimension must be positive")]
    InvalidShape(Vec<usize>),

    #[error("pixel range mismatch: {0}")]
    RangeMismatch(String),

    #[error("{stage} produced a non-finite loss ({value})")]
    NonFiniteLoss { stage: &'static str, value: f64 },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, GanError>;
