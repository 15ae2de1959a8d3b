//! Train on synthetic clips, then animate from the resulting checkpoints.

use crate::helpers::{dictionary, file_names, tiny_config, write_clips};
use candle_core::Device;
use std::sync::{Arc, Mutex};
use visemegan::{Trainer, TrainingEvent, VisemeClass, VisemeGanError, WordSynthesizer};

#[test]
fn trained_checkpoints_feed_synthesis() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_config(root.path());
    write_clips(&config, VisemeClass::OpenMouth, 3, 5);
    write_clips(&config, VisemeClass::TongueBehindTeeth, 2, 2);

    let trainer = Trainer::new(config.clone(), Device::Cpu);
    let results = trainer.train_all(&[VisemeClass::OpenMouth, VisemeClass::TongueBehindTeeth]);
    for (class, result) in &results {
        let report = result.as_ref().unwrap();
        assert_eq!(report.class, *class);
        assert_eq!(report.checkpoints, [1]);
    }

    let names = file_names(&config.paths.models_root.join("03_Open_Mouth"));
    assert_eq!(
        names,
        [
            "discriminator_epoch_1.safetensors",
            "epoch_001_frame_0.png",
            "epoch_001_frame_1.png",
            "epoch_001_frame_2.png",
            "generator_epoch_1.json",
            "generator_epoch_1.safetensors",
        ]
    );

    let mut synth = WordSynthesizer::new(&config, dictionary(root.path()), Device::Cpu);
    let anim = synth.synthesize_frames("cat").unwrap();
    assert_eq!(anim.frames.len(), 7);
    assert!(anim.skipped.is_empty());
}

#[test]
fn failures_are_reported_per_class() {
    let root = tempfile::tempdir().unwrap();
    let config = tiny_config(root.path());
    write_clips(&config, VisemeClass::Nasal, 2, 3);

    let events: Arc<Mutex<Vec<TrainingEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let events_clone = Arc::clone(&events);
    let trainer = Trainer::new(config, Device::Cpu).with_callback(Box::new(move |event| {
        events_clone.lock().unwrap().push(event);
    }));

    let results = trainer.train_all(&[VisemeClass::Lateral, VisemeClass::Nasal]);
    assert!(matches!(results[0].1, Err(VisemeGanError::Dataset(_))));
    assert!(results[1].1.is_ok());

    let events = events.lock().unwrap();
    assert!(matches!(
        events.first(),
        Some(TrainingEvent::ClassFailed {
            class: VisemeClass::Lateral,
            ..
        })
    ));
    assert!(matches!(
        events.last(),
        Some(TrainingEvent::ClassFinished {
            class: VisemeClass::Nasal,
            ..
        })
    ));
}

#[test]
fn repeated_checkpoints_continue_sample_numbering() {
    let root = tempfile::tempdir().unwrap();
    let mut config = tiny_config(root.path());
    config.train.epochs = 2;
    write_clips(&config, VisemeClass::SemiVowel, 2, 3);

    let trainer = Trainer::new(config.clone(), Device::Cpu);
    let report = trainer.train_class(VisemeClass::SemiVowel).unwrap();
    assert_eq!(report.checkpoints, [1, 2]);

    let dir = config.paths.models_root.join("10_Semi_Vowel");
    for name in [
        "epoch_001_frame_0.png",
        "epoch_001_frame_2.png",
        "epoch_002_frame_3.png",
        "epoch_002_frame_5.png",
    ] {
        assert!(dir.join(name).is_file(), "{name}");
    }
}
