//! End-to-end word synthesis against on-disk checkpoints.

use crate::helpers::{dictionary, file_names, has_ffmpeg, tiny_config, write_checkpoint};
use candle_core::Device;
use visemegan::media::{Ffmpeg, gif_frame_count};
use visemegan::synth::SkipReason;
use visemegan::{SamplingMode, VisemeClass, VisemeGanError, WordSynthesizer};

#[test]
fn cat_produces_seven_frames_gif_and_mp4() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_config(root.path());
    write_checkpoint(&config, VisemeClass::OpenMouth);
    write_checkpoint(&config, VisemeClass::TongueBehindTeeth);

    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    let result = synth.generate_word("cat");

    let out = &config.paths.output_root;
    let expected: Vec<_> = (1..=7).map(|i| format!("cat_{i:02}.png")).collect();
    assert_eq!(file_names(&out.join("cat")), expected);
    assert_eq!(gif_frame_count(&out.join("cat.gif")).unwrap(), 7);

    match result {
        Ok(output) => {
            assert_eq!(output.frame_paths.len(), 7);
            assert!(output.mp4.is_file());
            if has_ffmpeg() {
                let ffmpeg = Ffmpeg::discover(None).unwrap();
                assert_eq!(ffmpeg.frame_count(&output.mp4).unwrap(), 7);
            }
        }
        Err(VisemeGanError::EncoderNotFound { .. }) => assert!(!has_ffmpeg()),
        Err(e) => panic!("unexpected error: {e}"),
    }
}

#[test]
fn generated_frames_match_configured_size() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_config(root.path());
    write_checkpoint(&config, VisemeClass::OpenMouth);
    write_checkpoint(&config, VisemeClass::TongueBehindTeeth);

    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    let anim = synth.synthesize_frames("cat").unwrap();
    for frame in &anim.frames {
        assert_eq!(frame.dimensions(), (64, 64));
    }
}

#[test]
fn unmapped_phoneme_is_skipped_and_rest_is_animated() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_config(root.path());
    write_checkpoint(&config, VisemeClass::OpenMouth);
    write_checkpoint(&config, VisemeClass::TongueBehindTeeth);

    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    let anim = synth.synthesize_frames("dog").unwrap();
    assert_eq!(anim.frames.len(), 4);
    assert_eq!(anim.skipped.len(), 1);
    assert_eq!(anim.skipped[0].phoneme, "ao");
    assert_eq!(anim.skipped[0].reason, SkipReason::Unmapped);
}

#[test]
fn missing_checkpoint_skips_its_phonemes() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_config(root.path());
    write_checkpoint(&config, VisemeClass::TongueBehindTeeth);

    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    let anim = synth.synthesize_frames("cat").unwrap();
    // only the final t (2 frames) survives
    assert_eq!(anim.frames.len(), 2);
    let reasons: Vec<_> = anim.skipped.iter().map(|s| s.reason).collect();
    assert_eq!(
        reasons,
        [
            SkipReason::MissingCheckpoint(VisemeClass::OpenMouth),
            SkipReason::MissingCheckpoint(VisemeClass::OpenMouth)
        ]
    );
}

#[test]
fn word_with_nothing_to_animate_writes_no_files() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_config(root.path());

    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    for word in ["awe", "cat"] {
        let err = synth.generate_word(word).unwrap_err();
        assert!(matches!(err, VisemeGanError::EmptyAnimation { .. }), "{err}");
    }
    assert!(!config.paths.output_root.exists());
}

#[test]
fn unknown_word_fails_lookup() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_config(root.path());
    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    assert!(matches!(
        synth.generate_word("zzyzx"),
        Err(VisemeGanError::Lookup(_))
    ));
}

#[test]
fn per_clip_sampling_keeps_frame_budget() {
    let root = tempfile::tempdir().unwrap();
    let mut config = tiny_config(root.path());
    config.synth.sampling = SamplingMode::PerPhonemeClip;
    config.synth.base_duration_secs = 0.2;
    for class in [VisemeClass::OpenMouth, VisemeClass::Lateral, VisemeClass::RoundedLips] {
        write_checkpoint(&config, class);
    }

    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    let plan = synth.plan("hello").unwrap();
    let frames: Vec<_> = plan.slots.iter().map(|s| s.frames).collect();
    assert_eq!(frames, [5, 7, 5, 7]);
    assert_eq!(synth.synthesize_frames("hello").unwrap().frames.len(), 24);
}

#[test]
fn regenerating_a_word_replaces_its_frames() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_config(root.path());
    write_checkpoint(&config, VisemeClass::OpenMouth);
    write_checkpoint(&config, VisemeClass::TongueBehindTeeth);

    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    let _ = synth.generate_word("cat");
    let out = &config.paths.output_root;
    assert_eq!(file_names(&out.join("cat")).len(), 7);

    std::fs::remove_dir_all(
        config
            .paths
            .models_root
            .join(VisemeClass::TongueBehindTeeth.dir_name()),
    )
    .unwrap();
    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    let result = synth.generate_word("cat");

    let expected: Vec<_> = (1..=5).map(|i| format!("cat_{i:02}.png")).collect();
    assert_eq!(file_names(&out.join("cat")), expected);
    assert_eq!(gif_frame_count(&out.join("cat.gif")).unwrap(), 5);
    if let Ok(output) = result {
        let ffmpeg = Ffmpeg::discover(None).unwrap();
        assert_eq!(ffmpeg.frame_count(&output.mp4).unwrap(), 5);
    }
}
