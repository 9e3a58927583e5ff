//! Training-loop behaviour against recording stand-ins for the three models.

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use ferrite_gan::data::{Dataset, ImageShape, LatentShape};
use ferrite_gan::gan::{BatchMetrics, Composite, Discriminator, Generator};
use ferrite_gan::train::{BatchReport, EpochReport, Reporter};
use ferrite_gan::{train_loop, Evaluator, GanError, Matrix, TrainConfig};

const FAKE_PIXEL: f64 = -1.0;

#[derive(Debug, Clone)]
enum Call {
    Train { images: Matrix, labels: Matrix },
    Evaluate { rows: usize },
    Composite { rows: usize, labels: Matrix },
}

type Log = Rc<RefCell<Vec<Call>>>;

struct FixedGenerator {
    shape: ImageShape,
    updates: usize,
}

impl Generator for FixedGenerator {
    fn latent_shape(&self) -> LatentShape {
        LatentShape::Vector { dim: 3 }
    }

    fn output_shape(&self) -> ImageShape {
        self.shape
    }

    fn predict(&self, latent: &Matrix) -> ferrite_gan::Result<Matrix> {
        Ok(Matrix::filled(latent.rows, self.shape.len(), FAKE_PIXEL))
    }
}

struct RecordingDiscriminator {
    shape: ImageShape,
    log: Log,
    /// 0-based train call that reports a NaN loss.
    nan_at: Option<usize>,
    train_calls: usize,
}

impl Discriminator for RecordingDiscriminator {
    fn input_shape(&self) -> ImageShape {
        self.shape
    }

    fn train_on_batch(&mut self, images: &Matrix, labels: &Matrix) -> ferrite_gan::Result<BatchMetrics> {
        self.log.borrow_mut().push(Call::Train { images: images.clone(), labels: labels.clone() });
        let loss = if self.nan_at == Some(self.train_calls) { f64::NAN } else { 0.6 };
        self.train_calls += 1;
        Ok(BatchMetrics { loss, accuracy: 0.5 })
    }

    fn evaluate(&self, images: &Matrix, _labels: &Matrix) -> ferrite_gan::Result<BatchMetrics> {
        self.log.borrow_mut().push(Call::Evaluate { rows: images.rows });
        Ok(BatchMetrics { loss: 0.7, accuracy: 0.25 })
    }
}

struct RecordingComposite {
    log: Log,
    /// 0-based composite call that reports a NaN loss.
    nan_at: Option<usize>,
    calls: usize,
}

impl Composite<FixedGenerator, RecordingDiscriminator> for RecordingComposite {
    fn train_on_batch(
        &mut self,
        generator: &mut FixedGenerator,
        _discriminator: &RecordingDiscriminator,
        latent: &Matrix,
        labels: &Matrix,
    ) -> ferrite_gan::Result<f64> {
        generator.updates += 1;
        self.log.borrow_mut().push(Call::Composite { rows: latent.rows, labels: labels.clone() });
        let loss = if self.nan_at == Some(self.calls) { f64::NAN } else { 0.9 };
        self.calls += 1;
        Ok(loss)
    }
}

#[derive(Default)]
struct Recorder {
    batches: Vec<BatchReport>,
    epochs: Vec<EpochReport>,
    break_after_batches: Option<usize>,
}

impl Reporter for Recorder {
    fn report_batch(&mut self, report: &BatchReport) -> ControlFlow<()> {
        self.batches.push(report.clone());
        match self.break_after_batches {
            Some(n) if self.batches.len() >= n => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    }

    fn report_epoch(&mut self, report: &EpochReport) -> ControlFlow<()> {
        self.epochs.push(report.clone());
        ControlFlow::Continue(())
    }
}

struct Harness {
    generator: FixedGenerator,
    discriminator: RecordingDiscriminator,
    composite: RecordingComposite,
    dataset: Dataset,
    log: Log,
}

/// `n` two-pixel images; image `i` holds `(i + 1) / 100` in both pixels.
fn harness(n: usize) -> Harness {
    let shape = ImageShape::new(1, 2, 1);
    let images = (0..n).map(|i| vec![(i + 1) as f64 / 100.0; 2]).collect();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    Harness {
        generator: FixedGenerator { shape, updates: 0 },
        discriminator: RecordingDiscriminator { shape, log: Rc::clone(&log), nan_at: None, train_calls: 0 },
        composite: RecordingComposite { log: Rc::clone(&log), nan_at: None, calls: 0 },
        dataset: Dataset::from_images(shape, images).unwrap(),
        log,
    }
}

impl Harness {
    fn run(&mut self, config: &TrainConfig, reporter: &mut Recorder) -> ferrite_gan::Result<ferrite_gan::train::TrainSummary> {
        self.run_with(config, &Evaluator::default(), reporter)
    }

    fn run_with(
        &mut self,
        config: &TrainConfig,
        evaluator: &Evaluator,
        reporter: &mut Recorder,
    ) -> ferrite_gan::Result<ferrite_gan::train::TrainSummary> {
        train_loop(
            &mut self.generator,
            &mut self.discriminator,
            &mut self.composite,
            &self.dataset,
            config,
            evaluator,
            reporter,
        )
    }

    fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }
}

fn seeded(epochs: usize, batch_size: usize) -> TrainConfig {
    TrainConfig { seed: Some(7), ..TrainConfig::new(epochs, batch_size) }
}

#[test]
fn discriminator_sees_real_half_then_fake_half() {
    let mut h = harness(20);
    h.run(&seeded(1, 4), &mut Recorder::default()).unwrap();

    let Call::Train { images, labels } = &h.calls()[0] else {
        panic!("first call must be a discriminator update");
    };
    assert_eq!((images.rows, images.cols), (4, 2));
    assert_eq!(images.row(0), &[0.01, 0.01]);
    assert_eq!(images.row(1), &[0.02, 0.02]);
    assert_eq!(images.row(2), &[FAKE_PIXEL, FAKE_PIXEL]);
    assert_eq!(images.row(3), &[FAKE_PIXEL, FAKE_PIXEL]);
    assert_eq!(labels.data, vec![1.0, 1.0, 0.0, 0.0]);
}

#[test]
fn one_epoch_runs_every_full_batch_and_one_evaluation() {
    let mut h = harness(20);
    let mut recorder = Recorder::default();
    let summary = h.run(&seeded(1, 4), &mut recorder).unwrap();

    assert_eq!(summary.batches_completed, 5);
    assert_eq!(summary.epochs_completed, 1);
    assert!(!summary.stopped);
    assert_eq!(recorder.batches.len(), 5);
    assert_eq!(recorder.epochs.len(), 1);
    assert!(recorder.batches.iter().all(|b| b.batches_per_epoch == 5));
    assert_eq!(recorder.batches.iter().map(|b| b.batch).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);

    // Evaluation scores min(100, 20) real and as many fake images.
    let evals: Vec<usize> = h
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::Evaluate { rows } => Some(*rows),
            _ => None,
        })
        .collect();
    assert_eq!(evals, vec![20, 20]);
    let epoch = &recorder.epochs[0];
    assert_eq!((epoch.real.accuracy, epoch.fake.accuracy), (0.25, 0.25));
    assert_eq!(epoch.samples, vec![vec![FAKE_PIXEL; 2]]);
}

#[test]
fn consecutive_batches_walk_the_dataset() {
    let mut h = harness(20);
    h.run(&seeded(2, 4), &mut Recorder::default()).unwrap();

    let firsts: Vec<f64> = h
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::Train { images, .. } => Some(images.get(0, 0)),
            _ => None,
        })
        .collect();
    // Half batch of 2 over 20 images cycles through ten slices.
    let expected: Vec<f64> = (0..10).map(|k| (2 * k + 1) as f64 / 100.0).collect();
    assert_eq!(firsts, expected);
}

#[test]
fn odd_batch_size_halves_down_for_the_discriminator() {
    let mut h = harness(20);
    h.run(&seeded(1, 5), &mut Recorder::default()).unwrap();

    for call in h.calls() {
        match call {
            Call::Train { images, labels } => {
                assert_eq!(images.rows, 4);
                assert_eq!(labels.data, vec![1.0, 1.0, 0.0, 0.0]);
            }
            Call::Composite { rows, .. } => assert_eq!(rows, 5),
            Call::Evaluate { .. } => {}
        }
    }
}

#[test]
fn generator_steps_follow_each_discriminator_update() {
    let mut h = harness(20);
    let config = TrainConfig { generator_steps: 3, eval_every: 0, ..seeded(1, 4) };
    h.run(&config, &mut Recorder::default()).unwrap();

    let pattern: String = h
        .calls()
        .iter()
        .map(|c| match c {
            Call::Train { .. } => 'D',
            Call::Composite { .. } => 'G',
            Call::Evaluate { .. } => 'E',
        })
        .collect();
    assert_eq!(pattern, "DGGG".repeat(5));
    assert_eq!(h.generator.updates, 15);
}

#[test]
fn composite_is_trained_on_all_ones_labels() {
    let mut h = harness(20);
    h.run(&seeded(1, 4), &mut Recorder::default()).unwrap();

    let composites: Vec<Matrix> = h
        .calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::Composite { labels, .. } => Some(labels),
            _ => None,
        })
        .collect();
    assert_eq!(composites.len(), 5);
    for labels in composites {
        assert_eq!((labels.rows, labels.cols), (4, 1));
        assert!(labels.data.iter().all(|&y| y == 1.0));
    }
}

#[test]
fn raised_stop_flag_ends_the_run_before_the_next_batch() {
    let mut h = harness(20);
    let flag = Arc::new(AtomicBool::new(true));
    let config = TrainConfig { stop_flag: Some(flag), ..seeded(3, 4) };
    let summary = h.run(&config, &mut Recorder::default()).unwrap();

    assert!(summary.stopped);
    assert_eq!(summary.batches_completed, 0);
    assert!(h.calls().is_empty());
}

#[test]
fn reporter_break_stops_after_that_batch() {
    let mut h = harness(20);
    let mut recorder = Recorder { break_after_batches: Some(7), ..Recorder::default() };
    let summary = h.run(&seeded(3, 4), &mut recorder).unwrap();

    assert!(summary.stopped);
    assert_eq!(summary.batches_completed, 7);
    assert_eq!(summary.epochs_completed, 1);
    assert_eq!(recorder.epochs.len(), 1);
    assert_eq!(summary.last_batch.map(|b| (b.epoch, b.batch)), Some((1, 1)));
}

#[test]
fn nan_discriminator_loss_aborts_with_its_position() {
    let mut h = harness(20);
    h.discriminator.nan_at = Some(2);
    let mut recorder = Recorder::default();
    let err = h.run(&seeded(1, 4), &mut recorder).unwrap_err();

    match err {
        GanError::TrainingStep { epoch, batch, source } => {
            assert_eq!((epoch, batch), (0, 2));
            assert!(matches!(*source, GanError::NonFiniteLoss { stage: "discriminator", .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(recorder.batches.len(), 2);
}

#[test]
fn mismatched_shapes_fail_before_any_update() {
    let mut h = harness(20);
    h.discriminator.shape = ImageShape::new(2, 1, 1);
    let err = h.run(&seeded(1, 4), &mut Recorder::default()).unwrap_err();

    assert!(matches!(err, GanError::ShapeMismatch(_)));
    assert!(h.calls().is_empty());
}

#[test]
fn batch_larger_than_dataset_is_rejected() {
    let mut h = harness(20);
    let err = h.run(&seeded(1, 21), &mut Recorder::default()).unwrap_err();
    assert!(matches!(err, GanError::InvalidBatchSize { batch_size: 21, dataset_size: 20, .. }));
}

#[test]
fn nan_generator_loss_aborts_without_another_discriminator_update() {
    let mut h = harness(20);
    // Two composite calls per batch: call 5 is the second step of batch 2.
    h.composite.nan_at = Some(5);
    let config = TrainConfig { generator_steps: 2, ..seeded(1, 4) };
    let mut recorder = Recorder::default();
    let err = h.run(&config, &mut recorder).unwrap_err();

    match err {
        GanError::TrainingStep { epoch, batch, source } => {
            assert_eq!((epoch, batch), (0, 2));
            assert!(matches!(*source, GanError::NonFiniteLoss { stage: "generator", .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(recorder.batches.len(), 2);
    assert_eq!(h.discriminator.train_calls, 3);
    assert!(matches!(h.calls().last(), Some(Call::Composite { .. })));
}

#[test]
fn empty_evaluation_batch_is_rejected_before_training() {
    let mut h = harness(40);
    let evaluator = Evaluator { batch_size: 0, ..Evaluator::default() };
    let mut recorder = Recorder::default();
    let err = h.run_with(&seeded(1, 8), &evaluator, &mut recorder).unwrap_err();

    assert!(matches!(err, GanError::InvalidBatchSize { batch_size: 0, .. }));
    assert!(recorder.batches.is_empty());
    assert!(h.calls().is_empty());
}
