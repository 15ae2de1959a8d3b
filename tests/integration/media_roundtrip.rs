//! Encoded animations keep their frame counts.

use crate::helpers::has_ffmpeg;
use image::{Rgb, RgbImage};
use visemegan::media::{Ffmpeg, encode_gif, gif_frame_count, write_frames};

fn frames(n: usize) -> Vec<RgbImage> {
    (0..n)
        .map(|i| RgbImage::from_pixel(64, 64, Rgb([(i * 20) as u8, 40, 200])))
        .collect()
}

#[test]
fn gif_frame_count_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    for n in [1, 7, 12] {
        let path = dir.path().join(format!("w{n}.gif"));
        encode_gif(&frames(n), &path, 40).unwrap();
        assert_eq!(gif_frame_count(&path).unwrap(), n);
    }
}

#[test]
fn mp4_frame_count_round_trip() {
    if !has_ffmpeg() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let ffmpeg = Ffmpeg::discover(None).unwrap();
    for n in [1, 7] {
        let word = format!("w{n}");
        let frames_dir = dir.path().join(&word);
        write_frames(&frames_dir, &word, &frames(n)).unwrap();

        let out = dir.path().join(format!("{word}.mp4"));
        ffmpeg.encode_sequence(&frames_dir, &word, 25, &out).unwrap();
        assert_eq!(ffmpeg.frame_count(&out).unwrap(), n);
    }
}
