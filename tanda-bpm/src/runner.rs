//! Batch enrichment of a whole catalog
//!
//! Rows are enriched in parallel on a dedicated rayon pool; each row depends
//! only on itself and the shared read-only index. Results are collected in
//! row order, written back into the catalog sequentially, and failures are
//! logged in the same order.

use crate::models::catalog::Catalog;
use crate::models::failure_log::FailureLog;
use crate::services::enrichment::{enrich_row, Enrichment};
use crate::services::file_index::FileIndex;
use crate::services::tempo_estimator::TempoEstimator;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Rows between progress log lines
pub const PROGRESS_INTERVAL: usize = 100;

/// Counts from one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub resolved: usize,
    /// Resolved rows whose tempo was octave-corrected
    pub adjusted: usize,
    pub file_not_found: usize,
    pub no_tempo: usize,
    pub out_of_range: usize,
}

impl BatchSummary {
    fn count(&mut self, enrichment: &Enrichment) {
        self.total += 1;
        match enrichment {
            Enrichment::Resolved { changed, .. } => {
                self.resolved += 1;
                if *changed {
                    self.adjusted += 1;
                }
            }
            Enrichment::FileNotFound => self.file_not_found += 1,
            Enrichment::NoTempoEstimate { .. } => self.no_tempo += 1,
            Enrichment::RangeCorrectionFailed { .. } => self.out_of_range += 1,
        }
    }

    pub fn failed(&self) -> usize {
        self.file_not_found + self.no_tempo + self.out_of_range
    }
}

/// Enrich every row of `catalog` in place
///
/// `workers` of `None` uses one thread per available core.
pub fn run_batch<E>(
    catalog: &mut Catalog,
    index: &FileIndex,
    estimator: &E,
    workers: Option<usize>,
) -> Result<(BatchSummary, FailureLog)>
where
    E: TempoEstimator + ?Sized,
{
    let rows = catalog.rows();
    let total = rows.len();
    let start = Instant::now();

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("tanda-worker-{}", i));
    if let Some(n) = workers.filter(|n| *n > 0) {
        builder = builder.num_threads(n);
    }
    let pool = builder.build().context("Failed to start worker pool")?;

    tracing::info!(rows = total, workers = pool.current_num_threads(), "Enriching catalog");

    let processed = AtomicUsize::new(0);
    let results: Vec<_> = pool.install(|| {
        rows.par_iter()
            .map(|row| {
                let result = enrich_row(row, index, estimator);
                let done = processed.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_INTERVAL == 0 {
                    tracing::info!("Progress: {}/{} rows", done, total);
                }
                result
            })
            .collect()
    });

    let mut summary = BatchSummary::default();
    let mut failures = FailureLog::new();
    for (idx, (row, enrichment)) in results.into_iter().enumerate() {
        catalog.update(idx, &row)?;
        summary.count(&enrichment);
        if let Some(reason) = enrichment.failure_reason() {
            failures.record(row.title, reason);
        }
    }

    tracing::info!(
        "Enrichment completed in {:.1?} | Total: {} | Resolved: {} (adjusted {}) | Not found: {} | No BPM: {} | Out of range: {}",
        start.elapsed(),
        summary.total,
        summary.resolved,
        summary.adjusted,
        summary.file_not_found,
        summary.no_tempo,
        summary.out_of_range
    );

    Ok((summary, failures))
}
