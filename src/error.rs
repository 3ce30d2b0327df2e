use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// A row narrower than the column layout declared for its relation.
#[derive(Debug, Error)]
#[error("row has {found} fields, layout needs at least {needed}")]
pub struct RowShapeError {
    pub needed: usize,
    pub found: usize,
}

/// Input relation missing, unreadable, or malformed. Fatal for the job.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("read error in {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("malformed row at line {line} of {path}: {source}")]
    MalformedRow {
        path: PathBuf,
        line: u64,
        #[source]
        source: RowShapeError,
    },
}

/// Temporary run storage failure. Fatal; partially written runs are
/// removed by their drop guards.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("cannot create run file: {0}")]
    Create(#[source] std::io::Error),
    #[error("cannot write run file: {0}")]
    Write(#[source] csv::Error),
    #[error("cannot flush run file: {0}")]
    Flush(#[source] std::io::Error),
    #[error("cannot reopen run file: {0}")]
    Reopen(#[source] std::io::Error),
    #[error("read error in run file: {0}")]
    Read(#[source] csv::Error),
    #[error("malformed run row: {0}")]
    MalformedRow(#[source] RowShapeError),
}

/// Output sink failure. Fatal mid-merge; runs created so far are still
/// deleted by their drop guards.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("cannot create output {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot write output: {0}")]
    Write(#[source] csv::Error),
}

/// Union of the failure kinds that can cross the join-engine boundary.
#[derive(Debug, Error)]
pub enum JoinError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}
