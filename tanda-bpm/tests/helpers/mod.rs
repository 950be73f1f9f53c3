//! Test Helper Utilities
//!
//! Shared utilities for testing tanda-bpm

#![allow(dead_code)]

pub mod audio_generator;
pub mod log_capture;

pub use audio_generator::{generate_click_wav, generate_test_library, touch_audio_file, ClickConfig};
pub use log_capture::{LogCapture, LogRecord};

use std::path::{Path, PathBuf};

/// Write catalog CSV text to `dir/name`
pub fn write_catalog(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, text).expect("write catalog");
    path
}

/// Fake estimator: tempo chosen by file stem, `None` for unknown stems
pub fn tempo_by_stem(table: &'static [(&'static str, f64)]) -> impl Fn(&Path) -> Option<f64> + Send + Sync {
    move |path: &Path| {
        let stem = path.file_stem()?.to_string_lossy().into_owned();
        table
            .iter()
            .find(|(name, _)| *name == stem)
            .map(|(_, bpm)| *bpm)
    }
}
