//! `ffmpeg` discovery and MP4 encoding.
//!
//! Probes well-known locations for an `ffmpeg` binary, validates it with
//! `ffmpeg -version`, and encodes numbered PNG sequences. Frame counts of
//! encoded videos are read back with the sibling `ffprobe`.

use crate::error::{Result, VisemeGanError};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Video codecs tried in order; the first one the build supports wins.
const CODECS: &[&str] = &["libx264", "mpeg4"];

/// A usable `ffmpeg` installation.
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    /// Absolute path to the `ffmpeg` binary.
    pub path: PathBuf,
    /// Parsed version string (e.g. `"6.1.1"`).
    pub version: String,
}

impl Ffmpeg {
    /// Discover a usable `ffmpeg` binary.
    ///
    /// Probes locations in this order:
    /// 1. `explicit_path` (if provided)
    /// 2. `PATH` lookup via [`which::which`]
    /// 3. `/usr/local/bin/ffmpeg`, `/opt/homebrew/bin/ffmpeg`, `/usr/bin/ffmpeg`
    ///
    /// # Errors
    ///
    /// [`VisemeGanError::EncoderNotFound`] if no candidate runs.
    pub fn discover(explicit_path: Option<&Path>) -> Result<Self> {
        let candidates = Self::build_candidate_list(explicit_path);

        for candidate in &candidates {
            if !candidate.is_file() {
                continue;
            }
            match Self::probe_version(candidate) {
                Ok(version) => {
                    debug!("using ffmpeg {version} at {}", candidate.display());
                    return Ok(Self {
                        path: candidate.clone(),
                        version,
                    });
                }
                Err(e) => debug!("skipping {}: {e}", candidate.display()),
            }
        }

        Err(VisemeGanError::EncoderNotFound {
            reason: format!(
                "searched {} location(s): {}",
                candidates.len(),
                candidates
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        })
    }

    fn build_candidate_list(explicit_path: Option<&Path>) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(5);
        if let Some(p) = explicit_path {
            candidates.push(p.to_path_buf());
        }
        if let Ok(found) = which::which("ffmpeg") {
            candidates.push(found);
        }
        for dir in ["/usr/local/bin", "/opt/homebrew/bin", "/usr/bin"] {
            let p = Path::new(dir).join("ffmpeg");
            if !candidates.contains(&p) {
                candidates.push(p);
            }
        }
        candidates
    }

    fn probe_version(path: &Path) -> Result<String> {
        let output = Command::new(path).arg("-version").output()?;
        if !output.status.success() {
            return Err(VisemeGanError::EncoderNotFound {
                reason: format!("{} -version exited with {}", path.display(), output.status),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ffmpeg_version(&stdout).ok_or_else(|| VisemeGanError::EncoderNotFound {
            reason: format!("could not parse version from `ffmpeg -version` output: {stdout}"),
        })
    }

    /// Encode `<frames_dir>/<word>_01.png ...` into `out` at `fps`.
    ///
    /// Odd frame sizes are padded to even, as yuv420p requires.
    pub fn encode_sequence(&self, frames_dir: &Path, word: &str, fps: u32, out: &Path) -> Result<()> {
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let pattern = frames_dir.join(format!("{word}_%02d.png"));

        let mut last_error = String::new();
        for codec in CODECS {
            let output = Command::new(&self.path)
                .args(["-y", "-loglevel", "error", "-framerate"])
                .arg(fps.to_string())
                .args(["-start_number", "1", "-i"])
                .arg(&pattern)
                .args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2"])
                .args(["-c:v", codec, "-pix_fmt", "yuv420p"])
                .arg(out)
                .output()?;
            if output.status.success() {
                debug!("encoded {} with {codec}", out.display());
                return Ok(());
            }
            last_error = String::from_utf8_lossy(&output.stderr).trim().to_owned();
            warn!("ffmpeg {codec} failed: {last_error}");
        }
        Err(VisemeGanError::Encode(format!(
            "ffmpeg could not encode {}: {last_error}",
            out.display()
        )))
    }

    /// `ffprobe` next to this `ffmpeg`, else on `PATH`.
    pub fn ffprobe(&self) -> Result<PathBuf> {
        let sibling = self.path.with_file_name(format!("ffprobe{}", std::env::consts::EXE_SUFFIX));
        if sibling.is_file() {
            return Ok(sibling);
        }
        which::which("ffprobe").map_err(|e| VisemeGanError::EncoderNotFound {
            reason: format!("ffprobe not found: {e}"),
        })
    }

    /// Decoded video frame count of `video`.
    pub fn frame_count(&self, video: &Path) -> Result<usize> {
        let output = Command::new(self.ffprobe()?)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-count_frames",
                "-show_entries",
                "stream=nb_read_frames",
                "-of",
                "csv=p=0",
            ])
            .arg(video)
            .output()?;
        if !output.status.success() {
            return Err(VisemeGanError::Encode(format!(
                "ffprobe failed on {}: {}",
                video.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        stdout
            .trim()
            .trim_end_matches(',')
            .parse()
            .map_err(|_| VisemeGanError::Encode(format!("unexpected ffprobe output: {stdout}")))
    }
}

/// Parse the version from `ffmpeg -version` output.
///
/// Expected first line: `"ffmpeg version 6.1.1-3ubuntu5 Copyright ..."`.
/// Returns the token after `version` (e.g. `"6.1.1-3ubuntu5"`).
pub fn parse_ffmpeg_version(output: &str) -> Option<String> {
    let line = output.lines().next()?.trim();
    let rest = line.strip_prefix("ffmpeg version ")?;
    let version = rest.split_whitespace().next()?;
    if version.is_empty() {
        return None;
    }
    Some(version.to_owned())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn parses_release_version() {
        let out = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023 the FFmpeg developers\nbuilt with gcc";
        assert_eq!(parse_ffmpeg_version(out).as_deref(), Some("6.1.1-3ubuntu5"));
    }

    #[test]
    fn parses_git_build_version() {
        let out = "ffmpeg version N-113000-g1234abcd Copyright (c) 2000-2024";
        assert_eq!(parse_ffmpeg_version(out).as_deref(), Some("N-113000-g1234abcd"));
    }

    #[test]
    fn rejects_unrelated_output() {
        assert_eq!(parse_ffmpeg_version(""), None);
        assert_eq!(parse_ffmpeg_version("uv 0.5.14"), None);
    }

    #[test]
    fn explicit_path_is_tried_first() {
        let list = Ffmpeg::build_candidate_list(Some(Path::new("/custom/ffmpeg")));
        assert_eq!(list[0], Path::new("/custom/ffmpeg"));
    }

    #[test]
    fn missing_explicit_binary_is_skipped() {
        let list = Ffmpeg::build_candidate_list(Some(Path::new("/nonexistent/ffmpeg")));
        assert!(list.len() > 1);
        match Ffmpeg::discover(Some(Path::new("/nonexistent/ffmpeg"))) {
            Ok(found) => assert_ne!(found.path, Path::new("/nonexistent/ffmpeg")),
            Err(e) => assert!(matches!(e, VisemeGanError::EncoderNotFound { .. })),
        }
    }

    #[test]
    fn encodes_sequence_when_available() {
        let Ok(ffmpeg) = Ffmpeg::discover(None) else {
            return;
        };
        if ffmpeg.ffprobe().is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let frames: Vec<_> = (0..5u8)
            .map(|i| RgbImage::from_pixel(15, 15, Rgb([i * 50, 0, 0])))
            .collect();
        crate::media::write_frames(dir.path(), "odd", &frames).unwrap();

        let out = dir.path().join("odd.mp4");
        ffmpeg.encode_sequence(dir.path(), "odd", 25, &out).unwrap();
        assert_eq!(ffmpeg.frame_count(&out).unwrap(), 5);
    }
}
