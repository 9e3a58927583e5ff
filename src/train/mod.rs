pub mod train_config;
pub mod report;
pub mod evaluator;
pub mod loop_fn;
pub mod snapshot;

pub use train_config::TrainConfig;
pub use report::{BatchReport, ChannelReporter, EpochReport, LogReporter, Reporter, TrainEvent};
pub use evaluator::Evaluator;
pub use loop_fn::{train_loop, TrainSummary};
