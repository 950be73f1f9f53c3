//! tanda-bpm library
//!
//! Matches catalog titles to audio files on disk, estimates each file's
//! tempo and folds the estimate into the range expected for the track's
//! dance genre (tango, vals, milonga).

pub mod logging;
pub mod models;
pub mod normalize;
pub mod runner;
pub mod services;
pub mod utils;

pub use models::{Catalog, CatalogRow, FailureLog, Genre, GenreRange};
pub use normalize::{normalize, variants, CanonicalKey};
pub use runner::{run_batch, BatchSummary};
pub use services::{
    enrich, enrich_row, match_title, Enrichment, FileIndex, MatchResult, OnsetTempoEstimator,
    TempoEstimator, TimeLimitedEstimator,
};
