//! CLI binary for visemegan.

use anyhow::Context;
use candle_core::Device;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::EnvFilter;
use visemegan::{
    Trainer, TrainingCallback, TrainingEvent, VisemeClass, VisemeGanConfig, WordSynthesizer,
};

/// Train per-viseme GANs and animate words with them.
#[derive(Parser)]
#[command(name = "visemegan", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Train viseme classes (all of them unless --class is given).
    Train {
        /// Class directory name, e.g. 03_Open_Mouth. Repeatable.
        #[arg(long = "class")]
        classes: Vec<VisemeClass>,
        /// Override the configured epoch count.
        #[arg(long)]
        epochs: Option<usize>,
        /// Stop each epoch after this many batches.
        #[arg(long)]
        max_batches: Option<usize>,
    },

    /// Generate PNG frames, a GIF and an MP4 for one word.
    Generate {
        /// Word to animate.
        #[arg(short, long)]
        word: String,
        /// Output directory (overrides config).
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Checkpoint epoch to load (overrides config).
        #[arg(long)]
        epoch: Option<usize>,
    },

    /// Save a grid of cropped training frames, one row per class.
    Preview {
        /// Frames per class.
        #[arg(long)]
        samples: Option<usize>,
        /// Output PNG path.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print phonemes, viseme classes, and frame counts for a word.
    Phonemes {
        /// Word to look up.
        #[arg(short, long)]
        word: String,
    },

    /// Write a default configuration file.
    InitConfig {
        /// Destination (defaults to the platform config path).
        path: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    // Suppress noisy dependency logs by default; RUST_LOG overrides.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("visemegan=info,candle_core=warn,candle_nn=warn")
        }))
        .init();

    let cli = Cli::parse();

    if let Command::InitConfig { path } = &cli.command {
        return init_config(path.as_deref());
    }

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Train {
            classes,
            epochs,
            max_batches,
        } => run_train(config, &classes, epochs, max_batches),
        Command::Generate { word, out, epoch } => run_generate(config, &word, out, epoch),
        Command::Preview { samples, out } => run_preview(&config, samples, out),
        Command::Phonemes { word } => run_phonemes(&config, &word),
        Command::InitConfig { .. } => Ok(()),
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<VisemeGanConfig> {
    if let Some(path) = explicit {
        return Ok(VisemeGanConfig::from_file(path)?);
    }
    let default_path = VisemeGanConfig::default_config_path();
    if default_path.is_file() {
        info!("using config {}", default_path.display());
        return Ok(VisemeGanConfig::from_file(&default_path)?);
    }
    let config = VisemeGanConfig::default();
    config.validate()?;
    Ok(config)
}

fn init_config(path: Option<&Path>) -> anyhow::Result<()> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(VisemeGanConfig::default_config_path);
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    VisemeGanConfig::default().save_to_file(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(feature = "metal")]
fn select_device() -> candle_core::Result<Device> {
    Device::new_metal(0)
}

#[cfg(not(feature = "metal"))]
fn select_device() -> candle_core::Result<Device> {
    Device::cuda_if_available(0)
}

fn run_train(
    mut config: VisemeGanConfig,
    classes: &[VisemeClass],
    epochs: Option<usize>,
    max_batches: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(epochs) = epochs {
        config.train.epochs = epochs;
    }
    if max_batches.is_some() {
        config.train.max_batches_per_epoch = max_batches;
    }
    config.validate()?;

    let device = select_device().context("failed to open compute device")?;
    let trainer = Trainer::new(config, device).with_callback(progress_callback());
    let results = trainer.train_all(classes);

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    for (class, result) in &results {
        match result {
            Ok(report) => println!(
                "  {class}: {} epochs, checkpoints at {:?}",
                report.epochs_completed, report.checkpoints
            ),
            Err(e) => println!("  {class}: FAILED ({e})"),
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} classes failed", results.len());
    }
    Ok(())
}

/// Render training events as one indicatif bar per class.
fn progress_callback() -> TrainingCallback {
    let current: Arc<Mutex<Option<ProgressBar>>> = Arc::new(Mutex::new(None));
    Box::new(move |event| {
        let Ok(mut slot) = current.lock() else {
            return;
        };
        match &event {
            TrainingEvent::ClassStarted { class, epochs, .. } => {
                let pb = ProgressBar::new(*epochs as u64);
                if let Ok(style) =
                    ProgressStyle::with_template("  {msg} [{bar:30}] {pos}/{len} epochs ETA {eta}")
                {
                    pb.set_style(style);
                }
                pb.set_message(class.to_string());
                *slot = Some(pb);
            }
            TrainingEvent::EpochFinished {
                class,
                epoch,
                losses,
                ..
            } => {
                if let Some(pb) = slot.as_ref() {
                    pb.set_position(*epoch as u64);
                    pb.set_message(format!(
                        "{class} G={:.4} D={:.4}",
                        losses.generator, losses.discriminator
                    ));
                }
            }
            TrainingEvent::CheckpointSaved { epoch, path, .. } => {
                if let Some(pb) = slot.as_ref() {
                    pb.println(format!("    epoch {epoch}: {}", path.display()));
                }
            }
            TrainingEvent::ClassFinished { .. } => {
                if let Some(pb) = slot.take() {
                    pb.finish();
                }
            }
            TrainingEvent::ClassFailed { class, message } => match slot.take() {
                Some(pb) => pb.abandon_with_message(format!("{class}: {message}")),
                None => eprintln!("  {class}: {message}"),
            },
        }
    })
}

fn run_generate(
    mut config: VisemeGanConfig,
    word: &str,
    out: Option<PathBuf>,
    epoch: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(epoch) = epoch {
        config.synth.inference_epoch = epoch;
    }
    if let Some(out) = out {
        config.paths.output_root = out;
    }

    let device = select_device().context("failed to open compute device")?;
    let mut synth = WordSynthesizer::from_config(&config, device)?;
    let output = synth.generate_word(word)?;

    for skipped in &output.skipped {
        println!("  skipped \"{}\" ({:?})", skipped.phoneme, skipped.reason);
    }
    println!("GIF saved to: {}", output.gif.display());
    println!("MP4 saved to: {}", output.mp4.display());
    Ok(())
}

fn run_preview(
    config: &VisemeGanConfig,
    samples: Option<usize>,
    out: Option<PathBuf>,
) -> anyhow::Result<()> {
    let out = out.unwrap_or_else(|| config.paths.output_root.join("cropped_preview_grid.png"));
    let grid = visemegan::preview::save_grid(
        &config.paths.cropped_dir,
        samples.unwrap_or(config.viz.samples_per_class),
        config.viz.tile_size,
        &out,
    )?;
    for (class, tiles) in &grid.rows {
        println!("  {class}: {tiles} frame(s)");
    }
    println!("Preview saved to: {}", out.display());
    Ok(())
}

fn run_phonemes(config: &VisemeGanConfig, word: &str) -> anyhow::Result<()> {
    let synth = WordSynthesizer::from_config(config, Device::Cpu)?;
    let plan = synth.plan(word)?;

    println!("{}:", plan.word);
    for slot in &plan.slots {
        let class = slot
            .class
            .map(|c| c.to_string())
            .unwrap_or_else(|| "(unmapped)".to_owned());
        println!(
            "  {:<4} {:<24} {:.3}s  {} frame(s)",
            slot.phoneme, class, slot.duration_secs, slot.frames
        );
    }
    println!("  total: {} frame(s)", plan.mapped_frames());
    Ok(())
}
