//! Matching, tempo estimation and enrichment services

pub mod candidate_matcher;
pub mod enrichment;
pub mod file_index;
pub mod file_scanner;
pub mod octave_corrector;
pub mod tempo_estimator;

pub use candidate_matcher::{match_title, MatchResult, FUZZY_THRESHOLD};
pub use enrichment::{enrich, enrich_row, Enrichment};
pub use file_index::FileIndex;
pub use file_scanner::{FileScanner, ScanError, ScanResult};
pub use octave_corrector::{adjust, Adjustment};
pub use tempo_estimator::{OnsetTempoEstimator, TempoEstimator, TimeLimitedEstimator};
