//! Word to lip animation.
//!
//! `word -> phonemes -> (viseme class, duration) -> frames -> PNG/GIF/MP4`.
//! Phonemes without a viseme class or without a trained generator are
//! skipped with a warning; the rest of the word is still animated.

pub mod arena;

use crate::config::{SamplingMode, SynthConfig, VisemeGanConfig};
use crate::dataset::resample;
use crate::duration::{DurationModel, VowelWeightedDuration, frame_count};
use crate::error::{Result, VisemeGanError};
use crate::media::{self, Ffmpeg, clip_to_images, frame_to_image};
use crate::model::{GanShape, TrainedGenerator};
use crate::phonemes::{self, PronunciationSource};
use crate::viseme::{VisemeClass, phoneme_to_viseme};
use candle_core::Device;
use image::RgbImage;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub use arena::GeneratorArena;

/// Timing and class of one phoneme.
#[derive(Debug, Clone, PartialEq)]
pub struct PhonemeSlot {
    pub phoneme: String,
    pub class: Option<VisemeClass>,
    pub duration_secs: f64,
    pub frames: usize,
}

/// Per-phoneme plan for a word, before any generator is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct WordPlan {
    pub word: String,
    pub slots: Vec<PhonemeSlot>,
}

impl WordPlan {
    /// Frames contributed by phonemes that have a viseme class.
    pub fn mapped_frames(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.class.is_some())
            .map(|s| s.frames)
            .sum()
    }
}

/// Why a phoneme contributed no frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No viseme class for the phoneme.
    Unmapped,
    /// The class has no checkpoint at the inference epoch.
    MissingCheckpoint(VisemeClass),
}

/// A skipped phoneme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub phoneme: String,
    pub reason: SkipReason,
}

/// Frames of a word, in playback order.
#[derive(Debug, Clone)]
pub struct WordAnimation {
    pub word: String,
    pub frames: Vec<RgbImage>,
    pub skipped: Vec<Skipped>,
}

/// Files written for a word.
#[derive(Debug, Clone)]
pub struct WordOutput {
    pub frame_paths: Vec<PathBuf>,
    pub gif: PathBuf,
    pub mp4: PathBuf,
    pub skipped: Vec<Skipped>,
}

/// Turns words into animations using per-class generators.
pub struct WordSynthesizer {
    synth: SynthConfig,
    output_root: PathBuf,
    pronunciations: Arc<dyn PronunciationSource>,
    durations: Box<dyn DurationModel>,
    arena: GeneratorArena,
}

impl WordSynthesizer {
    /// Synthesizer over an explicit pronunciation source.
    pub fn new(
        config: &VisemeGanConfig,
        pronunciations: Arc<dyn PronunciationSource>,
        device: Device,
    ) -> Self {
        let arena = GeneratorArena::new(
            config.paths.models_root.clone(),
            config.synth.inference_epoch,
            GanShape::from(&config.train),
            device,
        );
        Self {
            synth: config.synth.clone(),
            output_root: config.paths.output_root.clone(),
            pronunciations,
            durations: Box::new(VowelWeightedDuration::new(config.synth.base_duration_secs)),
            arena,
        }
    }

    /// Synthesizer over the process-wide CMU dictionary, loading it if needed.
    ///
    /// # Errors
    ///
    /// [`VisemeGanError::Lookup`] if no dictionary can be loaded.
    pub fn from_config(config: &VisemeGanConfig, device: Device) -> Result<Self> {
        let dict = phonemes::init(config.paths.dictionary.as_deref())?;
        Ok(Self::new(config, dict, device))
    }

    /// Replace the duration heuristic.
    pub fn with_duration_model(mut self, durations: Box<dyn DurationModel>) -> Self {
        self.durations = durations;
        self
    }

    /// Override where animations are written.
    pub fn with_output_root(mut self, output_root: PathBuf) -> Self {
        self.output_root = output_root;
        self
    }

    /// Phonemes, classes, durations, and frame counts of `word`.
    ///
    /// # Errors
    ///
    /// [`VisemeGanError::Lookup`] if the word is unknown.
    pub fn plan(&self, word: &str) -> Result<WordPlan> {
        let phonemes = phonemes::word_to_phonemes_with(self.pronunciations.as_ref(), word)?;
        let slots = phonemes
            .into_iter()
            .map(|phoneme| {
                let duration_secs = self.durations.estimate(&phoneme);
                PhonemeSlot {
                    class: phoneme_to_viseme(&phoneme),
                    frames: frame_count(duration_secs, self.synth.fps),
                    duration_secs,
                    phoneme,
                }
            })
            .collect();
        Ok(WordPlan {
            word: word.trim().to_lowercase(),
            slots,
        })
    }

    /// Generate the frames of `word` without writing anything.
    ///
    /// # Errors
    ///
    /// - [`VisemeGanError::Lookup`] if the word is unknown.
    /// - [`VisemeGanError::EmptyAnimation`] if every phoneme was skipped.
    /// - Tensor errors from a generator that exists but fails to load or run.
    pub fn synthesize_frames(&mut self, word: &str) -> Result<WordAnimation> {
        let plan = self.plan(word)?;
        let mut frames = Vec::with_capacity(plan.mapped_frames());
        let mut skipped = Vec::new();

        for slot in &plan.slots {
            let Some(class) = slot.class else {
                warn!("no viseme class for phoneme \"{}\", skipping", slot.phoneme);
                skipped.push(Skipped {
                    phoneme: slot.phoneme.clone(),
                    reason: SkipReason::Unmapped,
                });
                continue;
            };
            let Some(generator) = self.arena.get(class)? else {
                warn!(
                    "no {class} generator at epoch {}, skipping phoneme \"{}\"",
                    self.arena.epoch(),
                    slot.phoneme
                );
                skipped.push(Skipped {
                    phoneme: slot.phoneme.clone(),
                    reason: SkipReason::MissingCheckpoint(class),
                });
                continue;
            };
            frames.extend(sample_frames(generator, self.synth.sampling, slot.frames)?);
        }

        if frames.is_empty() {
            return Err(VisemeGanError::EmptyAnimation { word: plan.word });
        }
        Ok(WordAnimation {
            word: plan.word,
            frames,
            skipped,
        })
    }

    /// Generate `word` and write its PNG frames, GIF, and MP4.
    ///
    /// Files are written in that order; a failure leaves earlier files in
    /// place. File names use [`media::output_stem`] of the word.
    ///
    /// # Errors
    ///
    /// Everything [`Self::synthesize_frames`] returns, plus encoding errors and
    /// [`VisemeGanError::EncoderNotFound`] when no `ffmpeg` is available.
    pub fn generate_word(&mut self, word: &str) -> Result<WordOutput> {
        let animation = self.synthesize_frames(word)?;
        let name = &media::output_stem(&animation.word);

        let frames_dir = self.output_root.join(name);
        let frame_paths = media::write_frames(&frames_dir, name, &animation.frames)?;

        let gif = self.output_root.join(format!("{name}.gif"));
        media::encode_gif(&animation.frames, &gif, self.synth.gif_frame_ms)?;

        let mp4 = self.output_root.join(format!("{name}.mp4"));
        let ffmpeg = Ffmpeg::discover(self.synth.ffmpeg_path.as_deref())?;
        ffmpeg.encode_sequence(&frames_dir, name, self.synth.fps, &mp4)?;

        info!(
            "\"{name}\": {} frames -> {} and {}",
            frame_paths.len(),
            gif.display(),
            mp4.display()
        );
        Ok(WordOutput {
            frame_paths,
            gif,
            mp4,
            skipped: animation.skipped,
        })
    }
}

/// `count` frames from one class generator.
fn sample_frames(
    generator: &TrainedGenerator,
    mode: SamplingMode,
    count: usize,
) -> Result<Vec<RgbImage>> {
    match mode {
        SamplingMode::PerFrame => (0..count)
            .map(|_| frame_to_image(&generator.sample_clip()?.get(0)?))
            .collect(),
        SamplingMode::PerPhonemeClip => {
            let clip = clip_to_images(&generator.sample_clip()?)?;
            Ok(resample(&clip, count))
        }
    }
}
