//! tanda-bpm - fill in BPM for a tango music catalog
//!
//! Reads the catalog CSV, matches every title to an audio file under the
//! audio root, estimates and octave-corrects its tempo, and writes the
//! enriched catalog plus a failure log.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use tanda_bpm::logging;
use tanda_bpm::models::Catalog;
use tanda_bpm::services::{
    enrich_row, FileIndex, OnsetTempoEstimator, TempoEstimator, TimeLimitedEstimator,
};
use tanda_common::config::{expand_home, resolve_audio_root, TomlConfig, ENV_AUDIO_ROOT};

/// Command-line arguments for tanda-bpm
#[derive(Parser, Debug)]
#[command(name = "tanda-bpm")]
#[command(about = "Fill in genre-corrected BPM for a music catalog")]
#[command(version)]
struct Args {
    /// Top-level folder containing the audio files
    #[arg(short, long)]
    audio_root: Option<PathBuf>,

    /// Only process the first row whose title contains TITLE
    #[arg(short, long, value_name = "TITLE")]
    single: Option<String>,

    /// Verbose matching and tempo output
    #[arg(short, long)]
    debug: bool,

    /// Configuration file (default: <config dir>/tanda/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Catalog CSV to read
    #[arg(long)]
    input: Option<PathBuf>,

    /// Enriched catalog CSV to write
    #[arg(long)]
    output: Option<PathBuf>,

    /// Failure log to write
    #[arg(long)]
    failure_log: Option<PathBuf>,

    /// Worker threads for tempo estimation
    #[arg(short, long, env = "TANDA_WORKERS")]
    workers: Option<usize>,

    /// Per-file tempo estimation timeout in seconds (0 disables)
    #[arg(long, env = "TANDA_TIMEOUT_SECS")]
    timeout: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = logging::init(args.debug);

    let config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    log_level.apply_config_level(&config.logging.level);

    info!("Starting tanda-bpm {}", env!("CARGO_PKG_VERSION"));

    let audio_root = expand_home(&resolve_audio_root(
        args.audio_root.as_deref(),
        ENV_AUDIO_ROOT,
        &config,
    ));
    if !audio_root.exists() {
        bail!("Audio root {} does not exist", audio_root.display());
    }
    if !audio_root.is_dir() {
        bail!("Audio root {} is not a directory", audio_root.display());
    }
    let audio_root = audio_root
        .canonicalize()
        .with_context(|| format!("Failed to resolve audio root {}", audio_root.display()))?;
    info!("Audio root: {}", audio_root.display());

    let input = args.input.unwrap_or_else(|| config.paths.input_csv.clone());
    let output = args.output.unwrap_or_else(|| config.paths.output_csv.clone());
    let failure_log = args
        .failure_log
        .unwrap_or_else(|| config.paths.failure_log.clone());

    let index = FileIndex::build(&audio_root).context("Failed to index audio files")?;
    let mut catalog = Catalog::read(&input)
        .with_context(|| format!("Failed to read catalog {}", input.display()))?;

    let estimator = build_estimator(&config, args.timeout);

    match args.single {
        Some(needle) => {
            let idx = catalog
                .find_title(&needle)
                .with_context(|| format!("No catalog title contains '{}'", needle))?;
            let row = catalog
                .row(idx)
                .context("Matched row disappeared from catalog")?;

            info!(title = %row.title, genre = %row.genre, "Single-track run");
            info!("Title keys: {:?}", tanda_bpm::normalize::variants(&row.title));

            let (updated, enrichment) = enrich_row(&row, &index, estimator.as_ref());
            catalog.update(idx, &updated)?;

            info!(
                bpm = %enrichment.bpm_cell(),
                note = %enrichment.note(),
                "Result: {:?}",
                enrichment
            );
        }
        None => {
            let workers = args.workers.or(config.analysis.workers);
            let (summary, failures) =
                tanda_bpm::run_batch(&mut catalog, &index, estimator.as_ref(), workers)?;

            failures
                .save(&failure_log)
                .with_context(|| format!("Failed to write failure log {}", failure_log.display()))?;
            info!(
                "Failures/omissions: {} → {}",
                summary.failed(),
                failure_log.display()
            );
        }
    }

    catalog
        .write(&output)
        .with_context(|| format!("Failed to write catalog {}", output.display()))?;
    info!("Done, saved {}", output.display());

    Ok(())
}

/// Onset estimator, wrapped in a timeout unless it is disabled
fn build_estimator(config: &TomlConfig, timeout_override: Option<u64>) -> Arc<dyn TempoEstimator> {
    let onset: Arc<dyn TempoEstimator> =
        Arc::new(OnsetTempoEstimator::new().with_window(config.analysis.window_secs));

    let timeout_secs = timeout_override.unwrap_or(config.analysis.timeout_secs);
    if timeout_secs == 0 {
        return onset;
    }
    Arc::new(TimeLimitedEstimator::new(
        onset,
        Duration::from_secs(timeout_secs),
    ))
}
