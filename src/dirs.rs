//! Default directory locations.
//!
//! Uses the [`dirs`](::dirs) crate for platform-appropriate resolution.
//!
//! # Environment Overrides
//!
//! - `VISEMEGAN_CONFIG_DIR` overrides [`config_dir`]
//! - `VISEMEGAN_DATA_DIR` overrides [`data_dir`]

use std::path::PathBuf;

/// Config directory (`<platform config dir>/visemegan/`).
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("VISEMEGAN_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    ::dirs::config_dir()
        .map(|d| d.join("visemegan"))
        .unwrap_or_else(|| PathBuf::from("/tmp/visemegan-config"))
}

/// Data directory (`<platform data dir>/visemegan/`).
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("VISEMEGAN_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    ::dirs::data_dir()
        .map(|d| d.join("visemegan"))
        .unwrap_or_else(|| PathBuf::from("/tmp/visemegan-data"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Candidate locations for the CMU pronouncing dictionary, in probe order.
#[must_use]
pub fn dictionary_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![data_dir().join("cmudict.dict")];
    if let Some(home) = ::dirs::home_dir() {
        candidates.push(home.join(".visemegan").join("cmudict.dict"));
    }
    candidates.push(PathBuf::from("/usr/share/cmudict/cmudict.dict"));
    candidates
}
