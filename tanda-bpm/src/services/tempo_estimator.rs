//! Raw tempo estimation
//!
//! [`TempoEstimator`] is the seam between the enrichment pipeline and
//! whatever produces a BPM figure for an audio file. The bundled
//! [`OnsetTempoEstimator`] decodes the file, builds an onset-strength
//! envelope from frame energy and picks the strongest periodicity by
//! autocorrelation. Like any beat tracker it can land on half or double
//! the danced pulse; octave correction happens downstream.

use crate::services::octave_corrector::round_tenth;
use crate::utils::audio_decoder::decode_audio_file_cancellable;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Produces a raw BPM estimate for an audio file
///
/// `None` means no estimate: undecodable file, silence, too short.
pub trait TempoEstimator: Send + Sync {
    fn estimate(&self, path: &Path) -> Option<f64>;

    /// Estimate, giving up with `None` once `cancel` is set
    ///
    /// The default ignores the flag and runs [`estimate`](Self::estimate)
    /// to completion.
    fn estimate_cancellable(&self, path: &Path, cancel: &AtomicBool) -> Option<f64> {
        let _ = cancel;
        self.estimate(path)
    }
}

impl<F> TempoEstimator for F
where
    F: Fn(&Path) -> Option<f64> + Send + Sync,
{
    fn estimate(&self, path: &Path) -> Option<f64> {
        self(path)
    }
}

/// Analysis frame length in samples
const FRAME_SIZE: usize = 1024;
/// Hop between analysis frames in samples
const HOP_SIZE: usize = 512;
/// Centre of the tempo prior
const PRIOR_BPM: f64 = 120.0;
/// Width of the tempo prior in octaves
const PRIOR_OCTAVES: f64 = 1.0;

/// Energy-flux + autocorrelation tempo estimator
#[derive(Debug, Clone)]
pub struct OnsetTempoEstimator {
    window_secs: Option<f64>,
    min_bpm: f64,
    max_bpm: f64,
}

impl Default for OnsetTempoEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl OnsetTempoEstimator {
    pub fn new() -> Self {
        Self {
            window_secs: None,
            min_bpm: 40.0,
            max_bpm: 240.0,
        }
    }

    /// Only analyse the first `secs` seconds of each file
    pub fn with_window(mut self, secs: Option<f64>) -> Self {
        self.window_secs = secs;
        self
    }

    /// Estimate tempo from mono PCM samples
    pub fn estimate_samples(&self, samples: &[f32], sample_rate: u32) -> Option<f64> {
        self.analyse(samples, sample_rate, &AtomicBool::new(false))
    }

    fn analyse(&self, samples: &[f32], sample_rate: u32, cancel: &AtomicBool) -> Option<f64> {
        if sample_rate == 0 {
            return None;
        }

        let envelope = onset_envelope(samples);
        let frame_rate = sample_rate as f64 / HOP_SIZE as f64;

        let min_lag = ((60.0 * frame_rate / self.max_bpm).floor() as usize).max(1);
        let max_lag = (60.0 * frame_rate / self.min_bpm).ceil() as usize;
        if envelope.len() <= max_lag * 2 {
            tracing::debug!(frames = envelope.len(), "Too little audio for tempo estimation");
            return None;
        }

        let mean = envelope.iter().sum::<f64>() / envelope.len() as f64;
        let centred: Vec<f64> = envelope.iter().map(|v| v - mean).collect();
        if centred.iter().all(|v| v.abs() < 1e-9) {
            tracing::debug!("Flat onset envelope (silence or constant tone)");
            return None;
        }

        let mut acf = Vec::with_capacity(max_lag + 2);
        for lag in 0..=max_lag + 1 {
            if cancel.load(Ordering::Relaxed) {
                tracing::debug!("Tempo analysis cancelled");
                return None;
            }
            acf.push(
                centred
                    .iter()
                    .zip(&centred[lag..])
                    .map(|(a, b)| a * b)
                    .sum::<f64>(),
            );
        }

        let mut best: Option<(usize, f64)> = None;
        for lag in min_lag..=max_lag {
            let bpm = 60.0 * frame_rate / lag as f64;
            let weighted = acf[lag] * tempo_prior(bpm);
            if weighted > best.map_or(0.0, |(_, w)| w) {
                best = Some((lag, weighted));
            }
        }
        let (lag, _) = best?;

        let offset = parabolic_offset(acf[lag - 1], acf[lag], acf[lag + 1]);
        let bpm = 60.0 * frame_rate / (lag as f64 + offset);

        tracing::debug!(lag = lag, offset = offset, bpm = bpm, "Tempo estimate");
        Some(round_tenth(bpm))
    }
}

impl TempoEstimator for OnsetTempoEstimator {
    fn estimate(&self, path: &Path) -> Option<f64> {
        self.estimate_cancellable(path, &AtomicBool::new(false))
    }

    fn estimate_cancellable(&self, path: &Path, cancel: &AtomicBool) -> Option<f64> {
        match decode_audio_file_cancellable(path, self.window_secs, cancel) {
            Ok(audio) => self.analyse(&audio.samples, audio.sample_rate, cancel),
            Err(e) if cancel.load(Ordering::Relaxed) => {
                tracing::debug!(path = %path.display(), "Tempo estimation cancelled: {:#}", e);
                None
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Tempo estimation failed: {:#}", e);
                None
            }
        }
    }
}

/// Half-wave rectified log-energy difference per hop, lightly smoothed
///
/// Smoothing spreads each onset over neighbouring frames so a beat period
/// that falls between two lags still shows up as one peak.
fn onset_envelope(samples: &[f32]) -> Vec<f64> {
    if samples.len() < FRAME_SIZE {
        return Vec::new();
    }

    let energies: Vec<f64> = samples
        .windows(FRAME_SIZE)
        .step_by(HOP_SIZE)
        .map(|frame| {
            let sum_squares: f64 = frame.iter().map(|&s| (s as f64).powi(2)).sum();
            let rms = (sum_squares / frame.len() as f64).sqrt();
            (1.0 + 100.0 * rms).ln()
        })
        .collect();

    let flux: Vec<f64> = energies
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).max(0.0))
        .collect();

    (0..flux.len())
        .map(|i| {
            let prev = flux[i.saturating_sub(1)];
            let next = flux[(i + 1).min(flux.len() - 1)];
            0.25 * prev + 0.5 * flux[i] + 0.25 * next
        })
        .collect()
}

/// Log-normal preference for tempi near [`PRIOR_BPM`]
fn tempo_prior(bpm: f64) -> f64 {
    let octaves = (bpm / PRIOR_BPM).log2() / PRIOR_OCTAVES;
    (-0.5 * octaves * octaves).exp()
}

/// Vertex offset of the parabola through three equally spaced points
fn parabolic_offset(left: f64, centre: f64, right: f64) -> f64 {
    let denominator = left - 2.0 * centre + right;
    if denominator >= 0.0 {
        return 0.0;
    }
    (0.5 * (left - right) / denominator).clamp(-0.5, 0.5)
}

/// Abandons estimates that take longer than a timeout
///
/// The estimate runs on a helper thread. On timeout the caller gets `None`
/// and the helper's cancel flag is raised, so a cancellable inner estimator
/// stops at its next check. A panicking estimator also yields `None`.
pub struct TimeLimitedEstimator {
    inner: Arc<dyn TempoEstimator>,
    timeout: Duration,
}

impl TimeLimitedEstimator {
    pub fn new(inner: Arc<dyn TempoEstimator>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl TempoEstimator for TimeLimitedEstimator {
    fn estimate(&self, path: &Path) -> Option<f64> {
        let (tx, rx) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        let owned: PathBuf = path.to_path_buf();
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);

        let spawned = thread::Builder::new()
            .name("tempo-estimate".to_string())
            .spawn(move || {
                let _ = tx.send(inner.estimate_cancellable(&owned, &worker_cancel));
            });
        if let Err(e) = spawned {
            tracing::warn!(path = %path.display(), error = %e, "Could not start tempo estimation thread");
            return None;
        }

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                cancel.store(true, Ordering::Relaxed);
                tracing::warn!(
                    path = %path.display(),
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Tempo estimation timed out"
                );
                None
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::warn!(path = %path.display(), "Tempo estimation thread ended without a result");
                None
            }
        }
    }
}
