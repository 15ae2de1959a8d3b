//! Word to phoneme lookup via the CMU Pronouncing Dictionary.
//!
//! The dictionary is loaded once per process through [`init`] / [`install`]
//! and read through [`dictionary`]. Lookups never re-read the file.

use crate::error::{Result, VisemeGanError};
use cmudict_fast::Cmudict;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::info;

/// A word pronunciation source.
pub trait PronunciationSource: Send + Sync {
    /// Raw symbols of the first pronunciation variant of `word`, or `None`
    /// if the word is unknown. `word` is already lowercased.
    fn first_pronunciation(&self, word: &str) -> Option<Vec<String>>;
}

/// CMU Pronouncing Dictionary backed by `cmudict-fast`.
pub struct CmuDictionary {
    dict: Cmudict,
}

impl CmuDictionary {
    /// Load a `cmudict.dict` file.
    ///
    /// # Errors
    ///
    /// Returns [`VisemeGanError::Lookup`] if the file is missing or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let dict = Cmudict::new(path).map_err(|e| {
            VisemeGanError::Lookup(format!(
                "failed to load CMU dictionary {}: {e}",
                path.display()
            ))
        })?;
        info!("loaded CMU dictionary from {}", path.display());
        Ok(Self { dict })
    }

    /// Load from `explicit` if given, otherwise the first existing
    /// [`crate::dirs::dictionary_candidates`] entry.
    ///
    /// # Errors
    ///
    /// Returns [`VisemeGanError::Lookup`] when no dictionary file is found.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidates = crate::dirs::dictionary_candidates();
        match candidates.iter().find(|p| p.is_file()) {
            Some(path) => Self::load(path),
            None => Err(VisemeGanError::Lookup(format!(
                "CMU dictionary not found; searched {}",
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))),
        }
    }
}

impl PronunciationSource for CmuDictionary {
    fn first_pronunciation(&self, word: &str) -> Option<Vec<String>> {
        let rules = self
            .dict
            .get(word)
            .or_else(|| self.dict.get(&word.to_uppercase()))?;
        let rule = rules.first()?;
        Some(rule.pronunciation().iter().map(|s| s.to_string()).collect())
    }
}

static DICTIONARY: OnceLock<Arc<dyn PronunciationSource>> = OnceLock::new();

/// Install a pronunciation source as the process-wide dictionary.
///
/// Returns `false` if one was already installed (the existing one is kept).
pub fn install(source: Arc<dyn PronunciationSource>) -> bool {
    DICTIONARY.set(source).is_ok()
}

/// Load the CMU dictionary once and install it, or return the installed one.
///
/// # Errors
///
/// Returns [`VisemeGanError::Lookup`] if nothing is installed yet and no
/// dictionary file can be loaded.
pub fn init(explicit: Option<&Path>) -> Result<Arc<dyn PronunciationSource>> {
    if let Some(existing) = DICTIONARY.get() {
        return Ok(Arc::clone(existing));
    }
    let loaded: Arc<dyn PronunciationSource> = Arc::new(CmuDictionary::discover(explicit)?);
    // Another thread may have won the race; either way the stored one is used.
    let _ = DICTIONARY.set(loaded);
    dictionary()
}

/// The installed process-wide dictionary.
///
/// # Errors
///
/// Returns [`VisemeGanError::Lookup`] if [`init`] or [`install`] was never called.
pub fn dictionary() -> Result<Arc<dyn PronunciationSource>> {
    DICTIONARY
        .get()
        .map(Arc::clone)
        .ok_or_else(|| VisemeGanError::Lookup("pronouncing dictionary not initialised".into()))
}

/// Phonemes of `word` using the process-wide dictionary.
///
/// # Errors
///
/// Returns [`VisemeGanError::Lookup`] if the dictionary is not initialised or
/// the word is unknown.
pub fn word_to_phonemes(word: &str) -> Result<Vec<String>> {
    word_to_phonemes_with(dictionary()?.as_ref(), word)
}

/// Phonemes of `word`: first variant, lowercased, stress digits stripped.
///
/// # Errors
///
/// Returns [`VisemeGanError::Lookup`] if the word is unknown. There is no
/// grapheme-to-phoneme fallback.
pub fn word_to_phonemes_with(source: &dyn PronunciationSource, word: &str) -> Result<Vec<String>> {
    let key = word.trim().to_lowercase();
    let raw = source
        .first_pronunciation(&key)
        .filter(|symbols| !symbols.is_empty())
        .ok_or_else(|| {
            VisemeGanError::Lookup(format!("no phonemes found for \"{word}\" in CMUdict"))
        })?;
    Ok(raw.iter().map(|s| normalize_symbol(s)).collect())
}

/// `AE1` -> `ae`.
fn normalize_symbol(symbol: &str) -> String {
    symbol
        .trim_end_matches(|c: char| c.is_ascii_digit())
        .to_ascii_lowercase()
}

/// Write a dictionary file in `cmudict.dict` format (used by tests and tooling).
///
/// # Errors
///
/// Returns an I/O error if the file cannot be written.
pub fn write_dictionary(path: &Path, entries: &[(&str, &str)]) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut body = String::new();
    for (word, pron) in entries {
        body.push_str(word);
        body.push(' ');
        body.push_str(pron);
        body.push('\n');
    }
    std::fs::write(path, body)?;
    Ok(path.to_path_buf())
}
