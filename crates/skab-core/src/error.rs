use std::path::PathBuf;

use thiserror::Error;

/// Failures raised while loading, splitting or fitting sensor data.
///
/// Every variant is fatal for the run. Rows that parse but violate the
/// record invariant are not errors; the loader drops them.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("directory not found: {0}")]
    NotFound(PathBuf),

    #[error("{path}:{line}: column {column}: {message}")]
    Parse {
        path: PathBuf,
        line: u64,
        column: usize,
        message: String,
    },

    #[error("malformed csv in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("dataset is empty after loading all sources")]
    EmptyDataset,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("eigen decomposition failed: {0}")]
    Decomposition(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
