//! Command-line interface mapped onto [`JobConfig`].

use std::path::PathBuf;

use clap::Parser;

use crate::config::{
    FilterConfig, JobConfig, MatchConfig, OutputConfig, RelationConfig, SortConfig,
    DEFAULT_RUN_SIZE, DEFAULT_THRESHOLD,
};
use crate::error::ConfigError;

#[derive(Parser, Debug)]
#[command(
    name = "record_joiner",
    version,
    about = "Bounded-memory fuzzy merge-join over two CSV relations",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Left relation CSV (header row required)
    #[arg(value_name = "LEFT")]
    pub left: PathBuf,
    /// Right relation CSV (header row required)
    #[arg(value_name = "RIGHT")]
    pub right: PathBuf,
    /// Output CSV path
    #[arg(value_name = "OUT", env = "RECORD_JOINER_OUT", default_value = "Result.csv")]
    pub out: PathBuf,
    /// Join-key column index in the left relation (0-based)
    #[arg(long = "left-key", env = "RECORD_JOINER_LEFT_KEY", default_value_t = 3)]
    pub left_key: usize,
    /// Join-key column index in the right relation (0-based)
    #[arg(long = "right-key", env = "RECORD_JOINER_RIGHT_KEY", default_value_t = 0)]
    pub right_key: usize,
    /// Filter column index in the right relation (0-based)
    #[arg(
        long = "filter-column",
        env = "RECORD_JOINER_FILTER_COLUMN",
        default_value_t = 1
    )]
    pub filter_column: usize,
    /// Value the filter column must equal (case-insensitive)
    #[arg(
        long = "filter-value",
        env = "RECORD_JOINER_FILTER_VALUE",
        default_value = "Canada"
    )]
    pub filter_value: String,
    /// Similarity score required at the merge frontier (0.0-1.0)
    #[arg(long, env = "RECORD_JOINER_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,
    /// Records held in memory before a sorted run is flushed
    #[arg(long = "run-size", env = "RECORD_JOINER_RUN_SIZE", default_value_t = DEFAULT_RUN_SIZE)]
    pub run_size: usize,
    /// Directory for temporary run files (system temp dir when unset)
    #[arg(long = "tmp-dir", env = "RECORD_JOINER_TMP_DIR")]
    pub tmp_dir: Option<PathBuf>,
    /// Write a Key/Value summary CSV describing the run
    #[arg(long = "summary", env = "RECORD_JOINER_SUMMARY")]
    pub summary: Option<PathBuf>,
}

impl Cli {
    pub fn into_config(self) -> Result<JobConfig, ConfigError> {
        let cfg = JobConfig {
            left: RelationConfig {
                path: self.left,
                key_column: self.left_key,
            },
            right: RelationConfig {
                path: self.right,
                key_column: self.right_key,
            },
            filter: FilterConfig {
                column: self.filter_column,
                expected: self.filter_value,
            },
            sort: SortConfig {
                run_size: self.run_size,
                tmp_dir: self.tmp_dir,
            },
            matching: MatchConfig {
                threshold: self.threshold,
            },
            output: OutputConfig {
                path: self.out,
                summary_path: self.summary,
            },
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
