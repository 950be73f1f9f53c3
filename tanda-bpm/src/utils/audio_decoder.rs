//! Audio Decoding Utilities
//!
//! Decode audio files to mono f32 PCM samples for tempo analysis.
//!
//! Uses symphonia for format-agnostic decoding (MP3, FLAC, AAC, OGG, WAV).

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Decoded audio result
#[derive(Debug)]
pub struct DecodedAudio {
    /// Mono audio samples (f32, range [-1.0, 1.0])
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Original channel count
    pub channels: usize,
    /// Duration of the decoded samples in seconds
    pub duration_seconds: f64,
}

/// Decode an audio file to mono f32 PCM samples
///
/// `max_seconds` stops decoding once that much audio is collected.
///
/// # Errors
/// * File I/O errors
/// * Unsupported or unrecognised format
/// * No audio track, unknown sample rate
pub fn decode_audio_file(file_path: &Path, max_seconds: Option<f64>) -> Result<DecodedAudio> {
    decode_audio_file_cancellable(file_path, max_seconds, &AtomicBool::new(false))
}

/// [`decode_audio_file`] that gives up once `cancel` is set
///
/// The flag is checked before every packet.
pub fn decode_audio_file_cancellable(
    file_path: &Path,
    max_seconds: Option<f64>,
    cancel: &AtomicBool,
) -> Result<DecodedAudio> {
    tracing::debug!(path = %file_path.display(), "Decoding audio file");

    let file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open audio file: {}", file_path.display()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = file_path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .with_context(|| format!("Failed to probe audio file: {}", file_path.display()))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("Sample rate unknown")?;
    let channel_count = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(1);

    let sample_limit = max_seconds
        .filter(|s| *s > 0.0)
        .map(|s| (s * sample_rate as f64) as usize);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .with_context(|| format!("Failed to create decoder for: {}", file_path.display()))?;

    let mut all_samples: Vec<f32> = Vec::new();

    loop {
        if cancel.load(Ordering::Relaxed) {
            anyhow::bail!("Decoding cancelled: {}", file_path.display());
        }

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => {
                return Err(anyhow::anyhow!("Error reading packet: {}", e));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => all_samples.extend(convert_to_mono_f32(&decoded)),
            Err(SymphoniaError::DecodeError(e)) => {
                // Corrupt frame: skip it, keep the rest of the stream
                tracing::debug!(path = %file_path.display(), error = %e, "Skipping undecodable packet");
                continue;
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to decode packet in: {}", file_path.display())
                });
            }
        }

        if let Some(limit) = sample_limit {
            if all_samples.len() >= limit {
                all_samples.truncate(limit);
                break;
            }
        }
    }

    let duration_seconds = all_samples.len() as f64 / sample_rate as f64;

    tracing::debug!(
        path = %file_path.display(),
        sample_rate = sample_rate,
        channels = channel_count,
        duration_seconds = format!("{:.2}", duration_seconds),
        "Audio decoding complete"
    );

    Ok(DecodedAudio {
        samples: all_samples,
        sample_rate,
        channels: channel_count,
        duration_seconds,
    })
}

/// Convert audio buffer to mono f32 samples by averaging channels
fn convert_to_mono_f32(decoded: &AudioBufferRef) -> Vec<f32> {
    match decoded {
        AudioBufferRef::F32(buf) => {
            let num_channels = buf.spec().channels.count();
            let mut mono = Vec::with_capacity(buf.frames());

            for frame_idx in 0..buf.frames() {
                let mut sum = 0.0f32;
                for ch in 0..num_channels {
                    sum += buf.chan(ch)[frame_idx];
                }
                mono.push(sum / num_channels as f32);
            }

            mono
        }
        AudioBufferRef::U8(buf) => mix_down(buf),
        AudioBufferRef::U16(buf) => mix_down(buf),
        AudioBufferRef::U24(buf) => mix_down(buf),
        AudioBufferRef::U32(buf) => mix_down(buf),
        AudioBufferRef::S8(buf) => mix_down(buf),
        AudioBufferRef::S16(buf) => mix_down(buf),
        AudioBufferRef::S24(buf) => mix_down(buf),
        AudioBufferRef::S32(buf) => mix_down(buf),
        AudioBufferRef::F64(buf) => mix_down(buf),
    }
}

fn mix_down<S: Sample>(buf: &AudioBuffer<S>) -> Vec<f32>
where
    f32: FromSample<S>,
{
    let num_channels = buf.spec().channels.count();
    let mut mono = Vec::with_capacity(buf.frames());

    for frame_idx in 0..buf.frames() {
        let mut sum = 0.0f32;
        for ch in 0..num_channels {
            sum += f32::from_sample(buf.chan(ch)[frame_idx]);
        }
        mono.push(sum / num_channels as f32);
    }

    mono
}
