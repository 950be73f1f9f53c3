//! Logging setup
//!
//! The subscriber is installed before the configuration file is read, so
//! messages from config loading reach the output. The level from the file
//! is applied afterwards through a reload handle, unless `RUST_LOG` or
//! `--debug` already fixed one.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Level in effect until the configuration is loaded
pub const STARTUP_LEVEL: &str = "info";

/// Filter directives for our own crates at `level`, everything else at warn
pub fn directives(level: &str) -> String {
    format!("warn,tanda_bpm={0},tanda_common={0}", level)
}

/// Filter used at startup and whether it is pinned
///
/// Priority: `RUST_LOG`, then `--debug`, then [`STARTUP_LEVEL`]. Only the
/// last can be replaced by the config file.
pub fn startup_filter(debug: bool) -> (EnvFilter, bool) {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return (filter, true);
    }
    if debug {
        return (EnvFilter::new(directives("debug")), true);
    }
    (EnvFilter::new(directives(STARTUP_LEVEL)), false)
}

/// Adjusts the installed filter once the configuration is known
pub struct LogLevelHandle {
    handle: reload::Handle<EnvFilter, Registry>,
    pinned: bool,
}

impl LogLevelHandle {
    /// Switch to the configured level
    ///
    /// Returns `false` when the level is pinned or could not be applied.
    pub fn apply_config_level(&self, level: &str) -> bool {
        if self.pinned {
            return false;
        }

        let filter = match EnvFilter::try_new(directives(level)) {
            Ok(filter) => filter,
            Err(e) => {
                tracing::warn!(level = level, error = %e, "Invalid log level in configuration");
                return false;
            }
        };

        match self.handle.reload(filter) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Could not change log level");
                false
            }
        }
    }
}

/// Wrap `filter` in a reloadable layer for a [`Registry`]
pub fn reloadable(filter: EnvFilter, pinned: bool) -> (reload::Layer<EnvFilter, Registry>, LogLevelHandle) {
    let (layer, handle) = reload::Layer::new(filter);
    (layer, LogLevelHandle { handle, pinned })
}

/// Install the global subscriber
pub fn init(debug: bool) -> LogLevelHandle {
    let (filter, pinned) = startup_filter(debug);
    let (filter, handle) = reloadable(filter, pinned);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();

    handle
}
