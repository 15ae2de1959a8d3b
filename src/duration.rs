//! Phoneme duration estimation.
//!
//! The default model is a fixed heuristic (vowels held 1.5x longer than
//! everything else), not fitted to acoustic data. It is the main limit on
//! timing fidelity, so synthesis takes any [`DurationModel`].

/// Vowel phonemes held longer by [`VowelWeightedDuration`].
pub const VOWELS: &[&str] = &[
    "aa", "ae", "ah", "eh", "ih", "iy", "er", "ey", "uh", "uw", "aw", "ow", "oy", "ay",
];

/// Assigns a playback duration to a phoneme.
pub trait DurationModel: Send + Sync {
    /// Duration of `phoneme` in seconds.
    fn estimate(&self, phoneme: &str) -> f64;
}

/// `base * vowel_scale` for vowels, `base` otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VowelWeightedDuration {
    /// Consonant duration in seconds.
    pub base: f64,
    /// Multiplier applied to vowels.
    pub vowel_scale: f64,
}

impl VowelWeightedDuration {
    /// Heuristic with the given base duration and the standard 1.5x vowel scale.
    pub fn new(base: f64) -> Self {
        Self {
            base,
            vowel_scale: 1.5,
        }
    }
}

impl Default for VowelWeightedDuration {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl DurationModel for VowelWeightedDuration {
    fn estimate(&self, phoneme: &str) -> f64 {
        if is_vowel(phoneme) {
            self.base * self.vowel_scale
        } else {
            self.base
        }
    }
}

/// Whether `phoneme` is in [`VOWELS`].
pub fn is_vowel(phoneme: &str) -> bool {
    VOWELS.contains(&phoneme)
}

/// Durations for a whole phoneme sequence.
pub fn estimate_all<S: AsRef<str>>(model: &dyn DurationModel, phonemes: &[S]) -> Vec<f64> {
    phonemes.iter().map(|p| model.estimate(p.as_ref())).collect()
}

/// Frames covering `duration_secs` at `fps`: `max(1, floor(duration * fps))`.
///
/// A small epsilon absorbs float error so that e.g. `0.1 * 30` counts as 3.
pub fn frame_count(duration_secs: f64, fps: u32) -> usize {
    let exact = duration_secs * f64::from(fps);
    let frames = (exact + 1e-9).floor();
    if frames < 1.0 { 1 } else { frames as usize }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vowels_are_one_and_a_half_times_base() {
        for base in [0.05, 0.1, 0.2, 1.0] {
            let model = VowelWeightedDuration::new(base);
            for v in VOWELS {
                assert!((model.estimate(v) - base * 1.5).abs() < 1e-12, "{v}");
            }
        }
    }

    #[test]
    fn consonants_get_base() {
        let model = VowelWeightedDuration::default();
        for c in ["k", "t", "b", "sh", "ng", "l", "y", "w"] {
            assert!((model.estimate(c) - 0.1).abs() < 1e-12, "{c}");
        }
    }

    #[test]
    fn cat_durations() {
        let model = VowelWeightedDuration::default();
        let d = estimate_all(&model, &["k", "ae", "t"]);
        assert!((d[0] - 0.1).abs() < 1e-12);
        assert!((d[1] - 0.15).abs() < 1e-12);
        assert!((d[2] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn cat_frame_counts_at_25_fps() {
        let model = VowelWeightedDuration::default();
        let counts: Vec<_> = estimate_all(&model, &["k", "ae", "t"])
            .into_iter()
            .map(|d| frame_count(d, 25))
            .collect();
        assert_eq!(counts, [2, 3, 2]);
    }

    #[test]
    fn frame_count_never_below_one() {
        assert_eq!(frame_count(0.0, 25), 1);
        assert_eq!(frame_count(0.01, 25), 1);
    }

    #[test]
    fn frame_count_tolerates_float_error() {
        assert_eq!(frame_count(0.1, 30), 3);
        assert_eq!(frame_count(0.2, 10), 2);
    }
}
