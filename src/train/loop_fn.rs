use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::data::{batches_per_epoch, fake_labels, inverted_labels, BatchCursor, Dataset, NoiseSampler};
use crate::gan::models::{ensure_finite, validate_pairing, BatchMetrics, Composite, Discriminator, Generator};
use crate::math::matrix::Matrix;
use crate::train::evaluator::Evaluator;
use crate::train::report::{BatchReport, EpochReport, Reporter};
use crate::train::train_config::TrainConfig;
use crate::{GanError, Result};

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Outcome of a `train_loop` run.
#[derive(Debug, Clone, Default)]
pub struct TrainSummary {
    /// Epochs that ran every one of their batches.
    pub epochs_completed: usize,
    pub batches_completed: usize,
    /// True when the stop flag or the reporter ended the run early.
    pub stopped: bool,
    pub last_batch: Option<BatchReport>,
    pub last_epoch: Option<EpochReport>,
}

/// Adversarial training of `generator` against `discriminator`.
///
/// Per batch: one discriminator update on `half_batch` real images followed
/// by `half_batch` generated ones (labels 1 then 0), then
/// `config.generator_steps` composite updates on `batch_size` fresh latent
/// samples labelled 1, then a `BatchReport`. After every epoch selected by
/// `config.eval_every` the evaluator runs and its report is emitted.
///
/// # Errors
/// - `InvalidBatchSize`, `Config`, `ShapeMismatch`, `RangeMismatch` before
///   the first batch, if the setup is inconsistent.
/// - `TrainingStep` wrapping whatever failed inside a batch or an
///   evaluation. The run is not resumed after a failure.
///
/// # Early termination
/// The loop stops between batches, returning `stopped = true`, if
/// `config.stop_flag` is raised or the reporter returns `Break`.
pub fn train_loop<G, D, C, R>(
    generator: &mut G,
    discriminator: &mut D,
    composite: &mut C,
    dataset: &Dataset,
    config: &TrainConfig,
    evaluator: &Evaluator,
    reporter: &mut R,
) -> Result<TrainSummary>
where
    G: Generator,
    D: Discriminator,
    C: Composite<G, D>,
    R: Reporter,
{
    config.validate(dataset.len())?;
    if config.eval_every > 0 {
        evaluator.validate(dataset.len())?;
    }
    validate_pairing(generator, discriminator, dataset)?;

    let per_epoch = batches_per_epoch(dataset.len(), config.batch_size);
    let mut state = TrainingState {
        cursor: BatchCursor::new(),
        noise: config.seed.map_or_else(NoiseSampler::from_entropy, NoiseSampler::seeded),
    };
    let mut summary = TrainSummary::default();

    info!(
        epochs = config.epochs,
        batches_per_epoch = per_epoch,
        batch_size = config.batch_size,
        generator_steps = config.generator_steps,
        "starting adversarial training"
    );
    let t_start = Instant::now();

    'epochs: for epoch in 0..config.epochs {
        for batch in 0..per_epoch {
            if config.stop_requested() {
                warn!(epoch, batch, "stop requested");
                summary.stopped = true;
                break 'epochs;
            }

            let report = run_batch(generator, discriminator, composite, dataset, config, &mut state)
                .map(|(disc, generator_loss)| BatchReport {
                    epoch,
                    batch,
                    batches_per_epoch: per_epoch,
                    discriminator_loss: disc.loss,
                    discriminator_accuracy: disc.accuracy,
                    generator_loss,
                })
                .map_err(|e| step_failed(epoch, batch, e))?;

            debug!(
                epoch,
                batch,
                d_loss = report.discriminator_loss,
                g_loss = report.generator_loss,
                "batch done"
            );
            summary.batches_completed += 1;
            let flow = reporter.report_batch(&report);
            summary.last_batch = Some(report);
            if flow.is_break() {
                summary.stopped = true;
                break 'epochs;
            }
        }

        summary.epochs_completed = epoch + 1;

        if config.evaluates_after(epoch) {
            let report = evaluator
                .evaluate_epoch(epoch, &*generator, &*discriminator, dataset)
                .map_err(|e| step_failed(epoch, per_epoch, e))?;
            let flow = reporter.report_epoch(&report);
            summary.last_epoch = Some(report);
            if flow.is_break() {
                summary.stopped = true;
                break;
            }
        }
    }

    info!(
        epochs = summary.epochs_completed,
        batches = summary.batches_completed,
        stopped = summary.stopped,
        elapsed_ms = t_start.elapsed().as_millis() as u64,
        "training finished"
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

/// Mutable run state: created at loop start, dropped at loop end.
struct TrainingState {
    cursor: BatchCursor,
    noise: NoiseSampler,
}

/// One batch: discriminator step, then the generator steps.
/// Returns the discriminator metrics and the last generator loss.
fn run_batch<G, D, C>(
    generator: &mut G,
    discriminator: &mut D,
    composite: &mut C,
    dataset: &Dataset,
    config: &TrainConfig,
    state: &mut TrainingState,
) -> Result<(BatchMetrics, f64)>
where
    G: Generator,
    D: Discriminator,
    C: Composite<G, D>,
{
    let disc = discriminator_step(&*generator, discriminator, dataset, config.half_batch(), state)?;

    let mut generator_loss = f64::NAN;
    for _ in 0..config.generator_steps {
        generator_loss = generator_step(generator, &*discriminator, composite, config.batch_size, state)?;
    }
    Ok((disc, generator_loss))
}

/// Real half first, generated half second, trained as one batch.
fn discriminator_step<G, D>(
    generator: &G,
    discriminator: &mut D,
    dataset: &Dataset,
    half: usize,
    state: &mut TrainingState,
) -> Result<BatchMetrics>
where
    G: Generator,
    D: Discriminator,
{
    let real = state.cursor.next_real_batch(dataset, half)?;

    let latent = state.noise.sample_latent(half, &generator.latent_shape())?;
    let fake_images = generator.predict(&latent)?;
    check_generated(&fake_images, half, generator)?;

    let images = Matrix::concat_rows(&[&real.images, &fake_images]);
    let labels = Matrix::concat_rows(&[&real.labels, &fake_labels(half)]);

    let metrics = discriminator.train_on_batch(&images, &labels)?;
    ensure_finite("discriminator", metrics.loss)?;
    Ok(metrics)
}

/// Fresh latent batch labelled "real", trained through the composite with the
/// discriminator borrowed immutably.
fn generator_step<G, D, C>(
    generator: &mut G,
    discriminator: &D,
    composite: &mut C,
    batch_size: usize,
    state: &mut TrainingState,
) -> Result<f64>
where
    G: Generator,
    D: Discriminator,
    C: Composite<G, D>,
{
    let latent = state.noise.sample_latent(batch_size, &generator.latent_shape())?;
    let labels = inverted_labels(batch_size);
    let loss = composite.train_on_batch(generator, discriminator, &latent, &labels)?;
    ensure_finite("generator", loss)
}

fn check_generated<G: Generator>(images: &Matrix, rows: usize, generator: &G) -> Result<()> {
    let expected = generator.output_shape().len();
    if images.rows != rows || images.cols != expected {
        return Err(GanError::ShapeMismatch(format!(
            "generator returned a {}x{} batch, expected {}x{}",
            images.rows, images.cols, rows, expected
        )));
    }
    Ok(())
}

fn step_failed(epoch: usize, batch: usize, source: GanError) -> GanError {
    error!(epoch, batch, error = %source, "training step failed; aborting run");
    GanError::TrainingStep { epoch, batch, source: Box::new(source) }
}
