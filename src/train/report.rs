use std::ops::ControlFlow;
use std::sync::mpsc;

use serde::{Serialize, Deserialize};
use tracing::info;

use crate::data::ImageShape;
use crate::gan::models::BatchMetrics;

/// Progress after one batch. `epoch` and `batch` are 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub epoch: usize,
    pub batch: usize,
    pub batches_per_epoch: usize,
    pub discriminator_loss: f64,
    pub discriminator_accuracy: f64,
    /// Loss of the last composite update in this batch.
    pub generator_loss: f64,
}

/// Discriminator performance at an epoch boundary plus a few generated
/// images for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    pub epoch: usize,
    /// Scored against all-ones labels.
    pub real: BatchMetrics,
    /// Scored against all-zeros labels.
    pub fake: BatchMetrics,
    pub sample_shape: ImageShape,
    /// Flattened generated images, `sample_shape.len()` values each.
    pub samples: Vec<Vec<f64>>,
}

/// Everything a run emits, in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TrainEvent {
    Batch(BatchReport),
    Epoch(EpochReport),
}

/// Sink for training progress.
///
/// Returning `ControlFlow::Break` ends the run cleanly after the current
/// batch, the same as raising the stop flag.
pub trait Reporter {
    fn report_batch(&mut self, report: &BatchReport) -> ControlFlow<()>;

    fn report_epoch(&mut self, report: &EpochReport) -> ControlFlow<()>;
}

/// Writes progress through `tracing`.
#[derive(Debug, Default)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report_batch(&mut self, r: &BatchReport) -> ControlFlow<()> {
        info!(
            "Epoch: {}, Batch: {}/{}, Discriminator Loss: {:.3}, Generator Loss: {:.3}",
            r.epoch + 1, r.batch + 1, r.batches_per_epoch, r.discriminator_loss, r.generator_loss
        );
        ControlFlow::Continue(())
    }

    fn report_epoch(&mut self, r: &EpochReport) -> ControlFlow<()> {
        info!(
            "Epoch {}: accuracy real: {:.2}%, fake: {:.2}%",
            r.epoch + 1, r.real.accuracy * 100.0, r.fake.accuracy * 100.0
        );
        ControlFlow::Continue(())
    }
}

/// Forwards every event over a channel. If the receiver has been dropped the
/// run stops.
pub struct ChannelReporter {
    tx: mpsc::Sender<TrainEvent>,
}

impl ChannelReporter {
    pub fn new(tx: mpsc::Sender<TrainEvent>) -> Self {
        ChannelReporter { tx }
    }

    fn send(&self, event: TrainEvent) -> ControlFlow<()> {
        match self.tx.send(event) {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    }
}

impl Reporter for ChannelReporter {
    fn report_batch(&mut self, report: &BatchReport) -> ControlFlow<()> {
        self.send(TrainEvent::Batch(report.clone()))
    }

    fn report_epoch(&mut self, report: &EpochReport) -> ControlFlow<()> {
        self.send(TrainEvent::Epoch(report.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch() -> BatchReport {
        BatchReport {
            epoch: 0,
            batch: 2,
            batches_per_epoch: 5,
            discriminator_loss: 0.7,
            discriminator_accuracy: 0.5,
            generator_loss: 0.69,
        }
    }

    #[test]
    fn channel_reporter_breaks_once_receiver_is_gone() {
        let (tx, rx) = mpsc::channel();
        let mut reporter = ChannelReporter::new(tx);
        assert_eq!(reporter.report_batch(&batch()), ControlFlow::Continue(()));
        assert_eq!(rx.recv().unwrap(), TrainEvent::Batch(batch()));
        drop(rx);
        assert_eq!(reporter.report_batch(&batch()), ControlFlow::Break(()));
    }

    #[test]
    fn events_serialize_with_a_tag() {
        let json = serde_json::to_value(TrainEvent::Batch(batch())).unwrap();
        assert_eq!(json["event"], "batch");
        assert_eq!(json["batches_per_epoch"], 5);
    }
}
