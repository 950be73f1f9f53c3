//! Bootstrap configuration and audio root resolution
//!
//! Settings come from four tiers, highest priority first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default
//!
//! A missing TOML file is not an error: the tool logs a warning and runs on
//! defaults. A TOML file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the audio scan root
pub const ENV_AUDIO_ROOT: &str = "TANDA_AUDIO_ROOT";

/// Environment variable naming an explicit config file
pub const ENV_CONFIG_FILE: &str = "TANDA_CONFIG";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TomlConfig {
    /// Directory scanned recursively for audio files
    #[serde(default)]
    pub audio_root: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Catalog and log file locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Tempo analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Catalog input/output and failure log paths
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PathsConfig {
    #[serde(default = "default_input_csv")]
    pub input_csv: PathBuf,

    #[serde(default = "default_output_csv")]
    pub output_csv: PathBuf,

    #[serde(default = "default_failure_log")]
    pub failure_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input_csv: default_input_csv(),
            output_csv: default_output_csv(),
            failure_log: default_failure_log(),
        }
    }
}

/// Tempo analysis settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct AnalysisConfig {
    /// Per-file tempo estimation timeout in seconds (0 disables the timeout)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Worker threads for row enrichment (None = available parallelism)
    #[serde(default)]
    pub workers: Option<usize>,

    /// Only analyse the first N seconds of each file (None = whole file)
    #[serde(default)]
    pub window_secs: Option<f64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            workers: None,
            window_secs: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_input_csv() -> PathBuf {
    PathBuf::from("music_library_tags.csv")
}

fn default_output_csv() -> PathBuf {
    PathBuf::from("music_library_tags_bpm.csv")
}

fn default_failure_log() -> PathBuf {
    PathBuf::from("bpm_failures.log")
}

fn default_timeout_secs() -> u64 {
    120
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub audio_root: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        // ~/Music on every desktop platform
        let audio_root = dirs::audio_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join("Music")))
            .unwrap_or_else(|| PathBuf::from("./Music"));

        Self {
            audio_root,
            log_level: default_log_level(),
        }
    }
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the config file for this run
    ///
    /// An explicit path (CLI or `TANDA_CONFIG`) must exist. Without one, the
    /// platform config file is used when present, otherwise defaults.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(ENV_CONFIG_FILE).map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::NotFound(format!(
                    "Config file {}",
                    path.display()
                )));
            }
            return Self::load(&path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "Loading config file");
                Self::load(&path)
            }
            _ => {
                warn!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Platform config file location: `<config_dir>/tanda/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("tanda").join("config.toml"))
}

/// Resolve the audio scan root
///
/// Priority: CLI argument → `env_var_name` → TOML `audio_root` → compiled default
pub fn resolve_audio_root(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    config: &TomlConfig,
) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &config.audio_root {
        return path.clone();
    }

    CompiledDefaults::for_current_platform().audio_root
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
