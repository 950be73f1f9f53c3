//! Audio Test Fixture Generator
//!
//! Click tracks with a known tempo, and placeholder files for index tests

use std::path::{Path, PathBuf};

/// Configuration for a generated click track
#[derive(Debug, Clone)]
pub struct ClickConfig {
    pub bpm: f64,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            bpm: 120.0,
            duration_seconds: 20.0,
            sample_rate: 44100,
            channels: 2,
        }
    }
}

/// Generate a 16-bit WAV with a 10 ms noise burst on every beat
pub fn generate_click_wav(path: &Path, config: &ClickConfig) -> anyhow::Result<PathBuf> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;
    let beat_period = 60.0 / config.bpm * config.sample_rate as f64;
    let click_len = (0.01 * config.sample_rate as f64) as usize;

    // Linear congruential noise, deterministic across runs
    let mut state: u32 = 0x1234_5678;
    for i in 0..total_samples {
        let beat = (i as f64 / beat_period).floor();
        let offset = i.saturating_sub((beat * beat_period) as usize);
        let sample = if offset < click_len {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let noise = (state >> 16) as f32 / 32768.0 - 1.0;
            (0.8 * noise * i16::MAX as f32) as i16
        } else {
            0
        };

        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// Create an empty file with an audio extension; enough for index tests
pub fn touch_audio_file(root: &Path, relative: &str) -> anyhow::Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, b"")?;
    Ok(path)
}

/// Create a tree of placeholder audio files
pub fn generate_test_library(root: &Path, relative_paths: &[&str]) -> anyhow::Result<Vec<PathBuf>> {
    relative_paths
        .iter()
        .map(|relative| touch_audio_file(root, relative))
        .collect()
}
