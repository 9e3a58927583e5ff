//! Trains the default dense GAN on generated seven-segment digits.
//!
//! Usage:
//!   cargo run --release -- --epochs 20 --snapshots samples
//!
//! Press Enter to stop training after the current batch. `--generate N`
//! writes N images from the trained generator once training ends.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ferrite_gan::data::synthetic::seven_segment_digits;
use ferrite_gan::data::{NoiseSampler, PixelRange};
use ferrite_gan::gan::Generator;
use ferrite_gan::train::snapshot::{save_generated, save_samples};
use ferrite_gan::train::{ChannelReporter, LogReporter, Reporter, TrainEvent};
use ferrite_gan::{train_loop, Gan, GanConfig};

/// Adversarial training of a dense generator/discriminator pair
#[derive(Parser)]
#[command(name = "ferrite-gan")]
#[command(about = "Train a GAN on synthetic 28x28 digits")]
struct Args {
    /// JSON run configuration; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of training epochs
    #[arg(short, long)]
    epochs: Option<usize>,

    /// Images per batch (half real, half generated for the discriminator)
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Generator updates per batch
    #[arg(long)]
    generator_steps: Option<usize>,

    /// Random seed for weights, noise and the dataset
    #[arg(long)]
    seed: Option<u64>,

    /// Number of synthetic training images
    #[arg(long, default_value = "2000")]
    dataset_size: usize,

    /// Directory for per-epoch sample images
    #[arg(long, default_value = "samples")]
    snapshots: PathBuf,

    /// Images to draw from the trained generator into the snapshot directory
    #[arg(long, default_value = "0")]
    generate: usize,

    /// Write the effective configuration to this file and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GanConfig::load_json(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => GanConfig::default(),
    };
    if let Some(epochs) = args.epochs {
        config.training.epochs = epochs;
    }
    if let Some(batch_size) = args.batch_size {
        config.training.batch_size = batch_size;
    }
    if let Some(steps) = args.generator_steps {
        config.training.generator_steps = steps;
    }
    if args.seed.is_some() {
        config.training.seed = args.seed;
    }

    if let Some(path) = &args.dump_config {
        config.save_json(path)?;
        info!("wrote configuration to {}", path.display());
        return Ok(());
    }

    let seed = config.training.seed.unwrap_or(0);
    let dataset = seven_segment_digits(args.dataset_size, seed)?;
    info!("generated {} training images", dataset.len());

    let Gan { mut generator, mut discriminator, mut composite } = Gan::build(&config.model, seed)?;
    let range = generator.output_range().unwrap_or(PixelRange::Unit);

    // Enter on stdin raises the stop flag.
    let stop_flag = Arc::new(AtomicBool::new(false));
    config.training.stop_flag = Some(Arc::clone(&stop_flag));
    thread::spawn(move || {
        let mut line = String::new();
        // EOF (no terminal attached) is not a stop request.
        if matches!(std::io::stdin().read_line(&mut line), Ok(n) if n > 0) {
            stop_flag.store(true, Ordering::SeqCst);
        }
    });

    let (tx, rx) = mpsc::channel::<TrainEvent>();
    let training = config.training.clone();
    let evaluation = config.evaluation.clone();
    let worker = thread::spawn(move || {
        let mut reporter = ChannelReporter::new(tx);
        let summary = train_loop(
            &mut generator,
            &mut discriminator,
            &mut composite,
            &dataset,
            &training,
            &evaluation,
            &mut reporter,
        );
        summary.map(|s| (s, generator))
    });

    let mut log = LogReporter;
    loop {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(TrainEvent::Batch(report)) => {
                let _ = log.report_batch(&report);
            }
            Ok(TrainEvent::Epoch(report)) => {
                let _ = log.report_epoch(&report);
                match save_samples(&report, range, &args.snapshots) {
                    Ok(paths) => {
                        for path in paths {
                            info!("saved {}", path.display());
                        }
                    }
                    Err(e) => warn!("could not save samples: {}", e),
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let (summary, generator) = worker
        .join()
        .map_err(|_| anyhow::anyhow!("training thread panicked"))??;

    if summary.stopped {
        info!(
            "stopped after {} batches ({} full epochs)",
            summary.batches_completed, summary.epochs_completed
        );
    } else {
        info!("training complete: {} epochs", summary.epochs_completed);
    }

    if args.generate > 0 {
        let mut noise = config.training.seed.map_or_else(NoiseSampler::from_entropy, NoiseSampler::seeded);
        let paths = save_generated(&generator, args.generate, &mut noise, &args.snapshots)?;
        info!("generated {} images in {}", paths.len(), args.snapshots.display());
    }
    Ok(())
}
