pub mod models;
pub mod dense;
pub mod builder;

pub use models::{validate_pairing, BatchMetrics, Composite, Discriminator, Generator};
pub use dense::{DenseComposite, DenseDiscriminator, DenseGenerator};
pub use builder::{Gan, ModelSpec};
