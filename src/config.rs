//! Trimming options and configuration file support.
//!
//! `TrimOptions` is the immutable record applied to every file of a run.
//! It can be built in code, read from a TOML file, and overridden from the
//! command line. Keys use the same camel-case names as the options table:
//!
//! ```toml
//! gapThreshold = 0.45
//! removeFullGapColumns = false
//! trimFlanking = false
//! flankThreshold = 0.45
//! threads = 4
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default for both thresholds.
pub const DEFAULT_THRESHOLD: f64 = 0.45;

/// Errors raised while loading or validating options.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be between 0 and 1 (got {value})")]
    ThresholdOutOfRange { name: &'static str, value: f64 },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Column filtering and flank trimming parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrimOptions {
    /// A column is kept only if its gap proportion is at most this value.
    pub gap_threshold: f64,
    /// Drop columns that are gaps in every sequence, whatever the threshold.
    pub remove_full_gap_columns: bool,
    /// Trim leading and trailing columns inward.
    pub trim_flanking: bool,
    /// Edge columns above this gap proportion are trimmed (flank trimming only).
    pub flank_threshold: f64,
}

impl Default for TrimOptions {
    fn default() -> Self {
        Self {
            gap_threshold: DEFAULT_THRESHOLD,
            remove_full_gap_columns: false,
            trim_flanking: false,
            flank_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl TrimOptions {
    /// Options that keep every column.
    pub fn keep_all() -> Self {
        Self {
            gap_threshold: 1.0,
            ..Self::default()
        }
    }

    pub fn with_gap_threshold(mut self, threshold: f64) -> Self {
        self.gap_threshold = threshold;
        self
    }

    pub fn with_remove_full_gap_columns(mut self, remove: bool) -> Self {
        self.remove_full_gap_columns = remove;
        self
    }

    /// Enables flank trimming with the given edge threshold.
    pub fn with_flank_trimming(mut self, threshold: f64) -> Self {
        self.trim_flanking = true;
        self.flank_threshold = threshold;
        self
    }

    /// Checks that both thresholds are finite and within `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_threshold("gapThreshold", self.gap_threshold)?;
        check_threshold("flankThreshold", self.flank_threshold)
    }

    /// A commented sample configuration with the default values.
    pub fn sample_toml() -> String {
        format!(
            r#"# coretrim configuration
# Keep a column only if its gap proportion is <= gapThreshold (0..1)
gapThreshold = {gap}
# Always drop columns that are gaps in every sequence
removeFullGapColumns = false
# Trim leading/trailing columns whose gap proportion is > flankThreshold
trimFlanking = false
flankThreshold = {flank}
# Worker threads for batch processing (omit for one per core)
# threads = 4
"#,
            gap = DEFAULT_THRESHOLD,
            flank = DEFAULT_THRESHOLD
        )
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ThresholdOutOfRange { name, value })
    }
}

/// Contents of a configuration file: trimming options plus batch settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(flatten)]
    pub options: TrimOptions,
    /// Worker threads for batch processing
    #[serde(default)]
    pub threads: Option<usize>,
}

impl FileConfig {
    /// Parses a TOML configuration.
    ///
    /// Values are not range-checked here so that command-line overrides can
    /// be applied first; call `TrimOptions::validate` on the merged options.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
