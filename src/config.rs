use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::models::RecordLayout;

/// Records held in memory before a sorted run is flushed.
pub const DEFAULT_RUN_SIZE: usize = 50_000;
/// Similarity score required at the merge frontier.
pub const DEFAULT_THRESHOLD: f64 = 0.90;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationConfig {
    pub path: PathBuf,
    /// 0-based join-key column index.
    pub key_column: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterConfig {
    /// 0-based column index in the right relation.
    pub column: usize,
    /// Value the filter column must equal, compared case-insensitively.
    pub expected: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SortConfig {
    pub run_size: usize,
    /// Scratch directory for run files; system temp dir when unset.
    pub tmp_dir: Option<PathBuf>,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            run_size: DEFAULT_RUN_SIZE,
            tmp_dir: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    pub threshold: f64,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    /// Optional Key/Value summary CSV describing the run.
    pub summary_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobConfig {
    pub left: RelationConfig,
    pub right: RelationConfig,
    pub filter: FilterConfig,
    #[serde(default)]
    pub sort: SortConfig,
    #[serde(default)]
    pub matching: MatchConfig,
    pub output: OutputConfig,
}

impl JobConfig {
    pub fn left_layout(&self) -> RecordLayout {
        RecordLayout::keyed(self.left.key_column)
    }

    pub fn right_layout(&self) -> RecordLayout {
        RecordLayout::with_filter(self.right.key_column, self.filter.column)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.left.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField { field: "left.path" });
        }
        if self.right.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField { field: "right.path" });
        }
        if self.output.path.as_os_str().is_empty() {
            return Err(ConfigError::MissingField {
                field: "output.path",
            });
        }
        if self.filter.expected.is_empty() {
            return Err(ConfigError::MissingField {
                field: "filter.expected",
            });
        }
        if self.sort.run_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sort.run_size",
                reason: "must be > 0".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.matching.threshold) {
            return Err(ConfigError::InvalidValue {
                field: "matching.threshold",
                reason: format!("{} not in 0..=1", self.matching.threshold),
            });
        }
        Ok(())
    }
}
