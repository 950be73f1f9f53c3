//! Tempo estimation against generated audio files

mod helpers;

use helpers::{generate_click_wav, ClickConfig};
use std::sync::Arc;
use std::time::Duration;
use tanda_bpm::services::{OnsetTempoEstimator, TempoEstimator, TimeLimitedEstimator};
use tempfile::TempDir;

#[test]
fn test_click_track_wav_near_120() {
    let temp_dir = TempDir::new().unwrap();
    let path = generate_click_wav(&temp_dir.path().join("click.wav"), &ClickConfig::default()).unwrap();

    let bpm = OnsetTempoEstimator::new().estimate(&path).unwrap();
    assert!((bpm - 120.0).abs() < 3.0, "estimated {}", bpm);
    // One decimal place
    assert!(((bpm * 10.0).round() - bpm * 10.0).abs() < 1e-9);
}

#[test]
fn test_analysis_window() {
    let temp_dir = TempDir::new().unwrap();
    let config = ClickConfig {
        duration_seconds: 30.0,
        sample_rate: 22050,
        channels: 1,
        ..Default::default()
    };
    let path = generate_click_wav(&temp_dir.path().join("click.wav"), &config).unwrap();

    let bpm = OnsetTempoEstimator::new()
        .with_window(Some(10.0))
        .estimate(&path)
        .unwrap();
    assert!((bpm - 120.0).abs() < 3.0, "estimated {}", bpm);

    // Two seconds is too short to see the slowest tempi twice over
    let short = OnsetTempoEstimator::new().with_window(Some(2.0));
    assert_eq!(short.estimate(&path), None);
}

#[test]
fn test_undecodable_file_has_no_estimate() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.mp3");
    std::fs::write(&path, b"not an mp3 at all").unwrap();

    assert_eq!(OnsetTempoEstimator::new().estimate(&path), None);
}

#[test]
fn test_time_limited_onset_estimator() {
    let temp_dir = TempDir::new().unwrap();
    let path = generate_click_wav(&temp_dir.path().join("click.wav"), &ClickConfig::default()).unwrap();

    let direct = OnsetTempoEstimator::new().estimate(&path);
    let limited = TimeLimitedEstimator::new(
        Arc::new(OnsetTempoEstimator::new()),
        Duration::from_secs(60),
    );
    assert_eq!(limited.estimate(&path), direct);
}
