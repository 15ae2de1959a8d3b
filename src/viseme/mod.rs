//! Phoneme to viseme-class mapping.
//!
//! A viseme is a visual mouth shape shared by one or more phonemes. Each
//! class owns its own generator, addressed on disk by [`VisemeClass::dir_name`].

use std::fmt;
use std::str::FromStr;

/// Coarse mouth-shape classes, one trained GAN each.
///
/// Directory numbering skips `11`; no phoneme maps to that slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VisemeClass {
    /// /p/, /b/, /m/ (lips pressed together)
    ClosedLips,
    /// /f/, /v/, /θ/, /ð/ (teeth on lip)
    TeethTouching,
    /// Open vowels plus /k/, /g/, /h/
    OpenMouth,
    /// /aʊ/, /oʊ/, /ɔɪ/, /w/ (rounded)
    RoundedLips,
    /// /t/, /d/, /n/, /s/, /z/ (tongue at ridge)
    TongueBehindTeeth,
    /// /r/, /dʒ/
    Retroflex,
    /// /ʃ/, /ʒ/, /tʃ/
    FricativeSibilant,
    /// /ŋ/
    Nasal,
    /// /l/
    Lateral,
    /// /j/
    SemiVowel,
    /// /aɪ/ (diphthong glide)
    ComplexSounds,
}

impl VisemeClass {
    /// Every class, in directory order.
    pub const ALL: [VisemeClass; 11] = [
        VisemeClass::ClosedLips,
        VisemeClass::TeethTouching,
        VisemeClass::OpenMouth,
        VisemeClass::RoundedLips,
        VisemeClass::TongueBehindTeeth,
        VisemeClass::Retroflex,
        VisemeClass::FricativeSibilant,
        VisemeClass::Nasal,
        VisemeClass::Lateral,
        VisemeClass::SemiVowel,
        VisemeClass::ComplexSounds,
    ];

    /// Directory name used for clips, checkpoints, and the CLI.
    pub fn dir_name(&self) -> &'static str {
        match self {
            VisemeClass::ClosedLips => "01_Closed_Lips",
            VisemeClass::TeethTouching => "02_Teeth_Touching",
            VisemeClass::OpenMouth => "03_Open_Mouth",
            VisemeClass::RoundedLips => "04_Rounded_Lips",
            VisemeClass::TongueBehindTeeth => "05_Tongue_Behind_Teeth",
            VisemeClass::Retroflex => "06_Retroflex",
            VisemeClass::FricativeSibilant => "07_Fricative_Sibilant",
            VisemeClass::Nasal => "08_Nasal",
            VisemeClass::Lateral => "09_Lateral",
            VisemeClass::SemiVowel => "10_Semi_Vowel",
            VisemeClass::ComplexSounds => "12_Complex_Sounds",
        }
    }
}

impl fmt::Display for VisemeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for VisemeClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VisemeClass::ALL
            .into_iter()
            .find(|c| c.dir_name() == s)
            .ok_or_else(|| format!("unknown viseme class \"{s}\""))
    }
}

/// ARPAbet phoneme (lowercase, no stress digit) to viseme class.
///
/// Silence and a few rare symbols (`ao`, `ax`, `dx`, ...) are intentionally
/// absent; callers must treat `None` as a skip.
pub fn phoneme_to_viseme(phoneme: &str) -> Option<VisemeClass> {
    let class = match phoneme {
        "b" | "p" | "m" => VisemeClass::ClosedLips,

        "f" | "v" | "th" | "dh" => VisemeClass::TeethTouching,

        "aa" | "ah" | "ae" | "eh" | "ih" | "iy" | "er" | "ey" | "g" | "k" | "uh" | "uw"
        | "hh" => VisemeClass::OpenMouth,

        "aw" | "ow" | "oy" | "w" => VisemeClass::RoundedLips,

        "t" | "d" | "n" | "s" | "z" => VisemeClass::TongueBehindTeeth,

        "r" | "jh" => VisemeClass::Retroflex,

        "sh" | "zh" | "ch" => VisemeClass::FricativeSibilant,

        "ng" => VisemeClass::Nasal,

        "l" => VisemeClass::Lateral,

        "y" => VisemeClass::SemiVowel,

        "ay" => VisemeClass::ComplexSounds,

        _ => return None,
    };
    Some(class)
}

/// Map a phoneme sequence, keeping unmapped phonemes as `None` so callers can
/// report exactly which ones were skipped.
pub fn phonemes_to_visemes<S: AsRef<str>>(phonemes: &[S]) -> Vec<Option<VisemeClass>> {
    phonemes
        .iter()
        .map(|p| phoneme_to_viseme(p.as_ref()))
        .collect()
}
