pub mod network;
pub mod spec;

pub use network::{ForwardTrace, Network};
pub use spec::{NetworkSpec, LayerSpec};
