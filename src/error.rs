//! Error types for the benchmark harness.
//!
//! `HarnessError` is fatal: bad configuration, an estimator that cannot be
//! launched, or a failing output surface. `ReportError` is recoverable and
//! only ever costs one trial (or one algorithm within a trial).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("invalid algorithm row mapping: {0}")]
    InvalidMapping(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("trace file {path} is not readable: {source}")]
    TraceUnreadable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to launch estimator {program}: {source}")]
    ProcessLaunch {
        program: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("blob encoding: {0}")]
    Blob(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

/// Why a trial (or one algorithm of a trial) produced no metrics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReportError {
    #[error("no report marker in estimator output")]
    ReportNotFound,

    #[error("{algorithm}: report row {row} is missing")]
    RowMissing { algorithm: String, row: usize },

    #[error("{algorithm}: row {row} column {column} is not a finite number ({value:?})")]
    RowMalformed {
        algorithm: String,
        row: usize,
        column: usize,
        value: String,
    },
}
