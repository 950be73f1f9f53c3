//! Tempo octave correction
//!
//! Beat trackers often lock onto half or double the danced pulse. The raw
//! estimate is doubled while below the genre range, then halved while above
//! it. An estimate that still lands outside the range after that (off by a
//! factor that is not a power of two) is left alone and reported.

use crate::models::genre::GenreRange;

/// Outcome of correcting one raw tempo
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// Value is inside the range; `changed` when it differs from the raw input
    Corrected { bpm: f64, changed: bool },
    /// Doubling/halving could not reach the range; raw value kept
    OutOfRange { raw: f64 },
}

impl Adjustment {
    /// Value to store: corrected, or the raw input on failure
    pub fn bpm(&self) -> f64 {
        match *self {
            Adjustment::Corrected { bpm, .. } => bpm,
            Adjustment::OutOfRange { raw } => raw,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, Adjustment::Corrected { changed: true, .. })
    }

    pub fn is_corrected(&self) -> bool {
        matches!(self, Adjustment::Corrected { .. })
    }
}

/// Move `raw_bpm` into `range` by powers of two
pub fn adjust(raw_bpm: f64, range: GenreRange) -> Adjustment {
    if !raw_bpm.is_finite() {
        return Adjustment::OutOfRange { raw: raw_bpm };
    }

    let mut bpm = raw_bpm;
    while bpm < range.low && bpm > 1.0 {
        bpm *= 2.0;
    }
    while bpm > range.high {
        bpm /= 2.0;
    }
    let bpm = round_tenth(bpm);

    if !range.contains(bpm) {
        tracing::debug!(
            raw_bpm = raw_bpm,
            range = %range,
            "Tempo outside genre range after octave correction"
        );
        return Adjustment::OutOfRange { raw: raw_bpm };
    }

    Adjustment::Corrected {
        bpm,
        changed: !is_close(bpm, raw_bpm),
    }
}

/// Round to one decimal place
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `|a - b| <= atol + rtol * |b|` with rtol 1e-5, atol 1e-8
fn is_close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-8 + 1e-5 * b.abs()
}
