//! Per-row enrichment
//!
//! Resolves a catalog row to an audio file, estimates its tempo and corrects
//! the estimate into the row's genre range. Every row ends in exactly one
//! [`Enrichment`] outcome; none of them is an error, and the legacy
//! `BPM`/`BPMNote` cell values are derived from it only when the row is
//! stored.

use crate::models::catalog::CatalogRow;
use crate::models::genre::{normalize_genre, Genre};
use crate::services::candidate_matcher::{match_title, MatchResult};
use crate::services::file_index::FileIndex;
use crate::services::octave_corrector::{adjust, Adjustment};
use crate::services::tempo_estimator::TempoEstimator;

pub const NOTE_FILE_NOT_FOUND: &str = "file-not-found";
pub const NOTE_NO_BPM: &str = "no-bpm";
pub const REASON_OUT_OF_RANGE: &str = "out-of-range";

/// Outcome of enriching one catalog row
///
/// `file` is the matched audio file relative to the scan root, with
/// forward slashes.
#[derive(Debug, Clone, PartialEq)]
pub enum Enrichment {
    /// Tempo found and inside the genre range
    Resolved {
        file: String,
        raw_bpm: f64,
        bpm: f64,
        changed: bool,
        genre: Genre,
    },
    /// No exact or sufficiently similar file
    FileNotFound,
    /// The estimator produced nothing for the matched file
    NoTempoEstimate { file: String },
    /// Octave correction could not reach the genre range; raw value kept
    RangeCorrectionFailed {
        file: String,
        raw_bpm: f64,
        genre: Genre,
    },
}

impl Enrichment {
    /// Tempo to store, if any
    pub fn bpm(&self) -> Option<f64> {
        match self {
            Enrichment::Resolved { bpm, .. } => Some(*bpm),
            Enrichment::RangeCorrectionFailed { raw_bpm, .. } => Some(*raw_bpm),
            Enrichment::FileNotFound | Enrichment::NoTempoEstimate { .. } => None,
        }
    }

    /// `BPM` cell: empty or one decimal place
    pub fn bpm_cell(&self) -> String {
        self.bpm().map(|bpm| format!("{:.1}", bpm)).unwrap_or_default()
    }

    /// `BPMNote` cell
    pub fn note(&self) -> String {
        match self {
            Enrichment::Resolved {
                file,
                changed: true,
                ..
            } => format!("{} (adj)", file),
            Enrichment::Resolved { file, .. } | Enrichment::RangeCorrectionFailed { file, .. } => {
                format!("{} (raw)", file)
            }
            Enrichment::FileNotFound => NOTE_FILE_NOT_FOUND.to_string(),
            Enrichment::NoTempoEstimate { .. } => NOTE_NO_BPM.to_string(),
        }
    }

    /// Failure-log reason; `None` for resolved rows
    pub fn failure_reason(&self) -> Option<&'static str> {
        match self {
            Enrichment::Resolved { .. } => None,
            Enrichment::FileNotFound => Some(NOTE_FILE_NOT_FOUND),
            Enrichment::NoTempoEstimate { .. } => Some(NOTE_NO_BPM),
            Enrichment::RangeCorrectionFailed { .. } => Some(REASON_OUT_OF_RANGE),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Enrichment::Resolved { .. })
    }

    /// Render into a row's `bpm` and `bpm_note`
    pub fn apply_to(&self, row: &mut CatalogRow) {
        row.bpm = self.bpm();
        row.bpm_note = self.note();
    }
}

/// Enrich one row
pub fn enrich<E>(row: &CatalogRow, index: &FileIndex, estimator: &E) -> Enrichment
where
    E: TempoEstimator + ?Sized,
{
    let path = match match_title(&row.title, index) {
        MatchResult::NotFound => {
            tracing::debug!(title = %row.title, "No audio file for title");
            return Enrichment::FileNotFound;
        }
        MatchResult::Exact { path, .. } | MatchResult::Fuzzy { path, .. } => path,
    };
    let file = index.relative_path(&path);

    let raw_bpm = match estimator.estimate(&path) {
        Some(bpm) => bpm,
        None => {
            tracing::debug!(title = %row.title, file = %file, "No tempo estimate");
            return Enrichment::NoTempoEstimate { file };
        }
    };

    let genre = normalize_genre(&row.genre);
    match adjust(raw_bpm, genre.range()) {
        Adjustment::Corrected { bpm, changed } => {
            tracing::debug!(
                title = %row.title,
                file = %file,
                genre = %genre,
                raw_bpm = raw_bpm,
                bpm = bpm,
                "Tempo resolved"
            );
            Enrichment::Resolved {
                file,
                raw_bpm,
                bpm,
                changed,
                genre,
            }
        }
        Adjustment::OutOfRange { raw } => {
            tracing::debug!(
                title = %row.title,
                file = %file,
                genre = %genre,
                raw_bpm = raw,
                "Tempo outside genre range"
            );
            Enrichment::RangeCorrectionFailed {
                file,
                raw_bpm: raw,
                genre,
            }
        }
    }
}

/// Enrich one row and return the updated copy alongside the outcome
pub fn enrich_row<E>(row: &CatalogRow, index: &FileIndex, estimator: &E) -> (CatalogRow, Enrichment)
where
    E: TempoEstimator + ?Sized,
{
    let enrichment = enrich(row, index, estimator);
    let mut updated = row.clone();
    enrichment.apply_to(&mut updated);
    (updated, enrichment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn index() -> FileIndex {
        let root = Path::new("/music");
        FileIndex::from_files(
            root,
            vec![
                PathBuf::from("/music/Di Sarli/01 La Cumparsita.mp3"),
                PathBuf::from("/music/Canaro/Milonga Sentimental.flac"),
                PathBuf::from("/music/Biagi/Lagrimitas de mi corazon.mp3"),
            ],
        )
    }

    fn fixed(bpm: f64) -> impl Fn(&Path) -> Option<f64> + Send + Sync {
        move |_: &Path| Some(bpm)
    }

    #[test]
    fn test_scenario_a_double_time_tango() {
        let row = CatalogRow::new("01 La Cumparsita (Orch. Di Sarli)", "");
        let (updated, enrichment) = enrich_row(&row, &index(), &fixed(140.0));

        assert_eq!(
            enrichment,
            Enrichment::Resolved {
                file: "Di Sarli/01 La Cumparsita.mp3".to_string(),
                raw_bpm: 140.0,
                bpm: 70.0,
                changed: true,
                genre: Genre::Tango,
            }
        );
        assert_eq!(updated.bpm_cell(), "70.0");
        assert_eq!(updated.bpm_note, "Di Sarli/01 La Cumparsita.mp3 (adj)");
        assert_eq!(enrichment.failure_reason(), None);
    }

    #[test]
    fn test_scenario_b_in_range_is_raw() {
        let row = CatalogRow::new("La Cumparsita", "Tango");
        let (updated, enrichment) = enrich_row(&row, &index(), &fixed(60.0));

        assert!(enrichment.is_resolved());
        assert_eq!(updated.bpm, Some(60.0));
        assert_eq!(updated.bpm_note, "Di Sarli/01 La Cumparsita.mp3 (raw)");
    }

    #[test]
    fn test_scenario_c_and_f_slow_estimates_doubled() {
        let row = CatalogRow::new("La Cumparsita", "Tango");
        for raw in [20.0, 10.0] {
            let enrichment = enrich(&row, &index(), &fixed(raw));
            assert_eq!(enrichment.bpm(), Some(80.0));
            assert!(enrichment.note().ends_with("(adj)"));
        }
    }

    #[test]
    fn test_scenario_d_fast_milonga_halved() {
        let row = CatalogRow::new("Milonga Sentimental", "Milonga");
        let enrichment = enrich(&row, &index(), &fixed(200.0));

        assert_eq!(enrichment.bpm_cell(), "100.0");
        assert_eq!(enrichment.note(), "Canaro/Milonga Sentimental.flac (adj)");
    }

    #[test]
    fn test_scenario_e_file_not_found() {
        let row = CatalogRow::new("Una Emocion", "Tango");
        let (updated, enrichment) = enrich_row(&row, &index(), &fixed(60.0));

        assert_eq!(enrichment, Enrichment::FileNotFound);
        assert_eq!(updated.bpm, None);
        assert_eq!(updated.bpm_cell(), "");
        assert_eq!(updated.bpm_note, "file-not-found");
        assert_eq!(enrichment.failure_reason(), Some("file-not-found"));
    }

    #[test]
    fn test_fuzzy_match_resolves() {
        // "lagrimitasdemicorazn" vs "lagrimitasdemicorazon": one deletion in 21
        let row = CatalogRow::new("Lagrimitas de mi Corazn", "Vals");
        let enrichment = enrich(&row, &index(), &fixed(70.0));

        assert_eq!(enrichment.note(), "Biagi/Lagrimitas de mi corazon.mp3 (raw)");
    }

    #[test]
    fn test_no_tempo_estimate() {
        let row = CatalogRow::new("La Cumparsita", "Tango");
        let none = |_: &Path| -> Option<f64> { None };
        let (updated, enrichment) = enrich_row(&row, &index(), &none);

        assert_eq!(
            enrichment,
            Enrichment::NoTempoEstimate {
                file: "Di Sarli/01 La Cumparsita.mp3".to_string()
            }
        );
        assert_eq!(updated.bpm_cell(), "");
        assert_eq!(updated.bpm_note, "no-bpm");
        assert_eq!(enrichment.failure_reason(), Some("no-bpm"));
    }

    #[test]
    fn test_range_correction_failure_keeps_raw() {
        let row = CatalogRow::new("Milonga Sentimental", "Milonga");
        let (updated, enrichment) = enrich_row(&row, &index(), &fixed(80.0));

        assert_eq!(
            enrichment,
            Enrichment::RangeCorrectionFailed {
                file: "Canaro/Milonga Sentimental.flac".to_string(),
                raw_bpm: 80.0,
                genre: Genre::Milonga,
            }
        );
        assert_eq!(updated.bpm_cell(), "80.0");
        assert_eq!(updated.bpm_note, "Canaro/Milonga Sentimental.flac (raw)");
        assert_eq!(enrichment.failure_reason(), Some("out-of-range"));
    }

    #[test]
    fn test_stale_values_overwritten() {
        let mut row = CatalogRow::new("Una Emocion", "");
        row.bpm = Some(99.0);
        row.bpm_note = "old.mp3 (raw)".to_string();

        let (updated, _) = enrich_row(&row, &index(), &fixed(60.0));
        assert_eq!(updated.bpm, None);
        assert_eq!(updated.bpm_note, "file-not-found");
        assert_eq!(updated.title, row.title);
    }

    #[test]
    fn test_estimator_not_called_without_match() {
        let row = CatalogRow::new("Una Emocion", "");
        let panicking = |_: &Path| -> Option<f64> { panic!("estimator called") };
        assert_eq!(enrich(&row, &index(), &panicking), Enrichment::FileNotFound);
    }
}
