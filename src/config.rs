//! YAML run configuration.
//!
//! A run file names the feature table, the token input and the output, and
//! carries the fingerprint and candidate settings. Every section except
//! `features.table` and `input.tokens` may be omitted.
//!
//! ```yaml
//! version: "1.0"
//! log_level: info
//! log_json: false
//!
//! features:
//!   table: data/phoible.csv
//!   delimiter: ","
//!   language_column: ISO6393
//!   phoneme_column: Phoneme
//!   first_feature_column: 11
//!   on_missing: abort          # or skip_token
//!
//! simhash:
//!   version: 1
//!   hash_bits: 128
//!   ngram_sizes: [1, 2, 3]
//!   features: [stride, stride_transposed, rows, columns]
//!   seed: 0
//!   backend: xxh3_128
//!   use_parallel: true
//!
//! candidates:
//!   window: 10
//!   bands: 64
//!   use_parallel: true
//!
//! input:
//!   tokens: data/words.tsv
//!   queries: data/queries.tsv   # optional; switches to search mode
//!
//! output:
//!   path: out/report.tsv        # optional; stdout when absent
//!   precision: 3
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use features::TableLayout;
use matcher::CandidateConfig;
use serde::{Deserialize, Serialize};
use simhash::SimHashConfig;
use thiserror::Error;

use crate::FeaturePolicy;

/// Errors that can occur when loading a run configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Configuration format version.
    pub version: String,

    /// Default tracing filter; `RUST_LOG` takes precedence.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Emit logs as JSON lines.
    #[serde(default)]
    pub log_json: bool,

    pub features: FeaturesSection,

    #[serde(default)]
    pub simhash: SimHashConfig,

    #[serde(default)]
    pub candidates: CandidateConfig,

    pub input: InputSection,

    #[serde(default)]
    pub output: OutputSection,
}

/// Where the phoneme feature table lives and how to read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesSection {
    pub table: PathBuf,

    #[serde(flatten)]
    pub layout: TableLayout,

    #[serde(default)]
    pub on_missing: FeaturePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputSection {
    /// Tab-separated token file: `language<TAB>graphemes<TAB>p1 p2 ...`.
    pub tokens: PathBuf,

    /// Optional query tokens in the same format.
    #[serde(default)]
    pub queries: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Significant digits of the similarity score column.
    #[serde(default = "default_precision")]
    pub precision: usize,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            path: None,
            precision: default_precision(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_precision() -> usize {
    3
}

impl RunConfig {
    /// Load a YAML configuration file from the given path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate YAML configuration from a string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: RunConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        self.simhash
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("simhash: {e}")))?;
        self.candidates
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("candidates: {e}")))?;

        if self.features.table.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "features.table must not be empty".to_string(),
            ));
        }
        if self.input.tokens.as_os_str().is_empty() {
            return Err(ConfigLoadError::Validation(
                "input.tokens must not be empty".to_string(),
            ));
        }
        if self.output.precision == 0 {
            return Err(ConfigLoadError::Validation(
                "output.precision must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
