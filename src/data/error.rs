use std::path::PathBuf;

use thiserror::Error;

/// Failures of the authenticated download.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("the server rejected the credentials (HTTP {0})")]
    Unauthorized(reqwest::StatusCode),

    #[error("the server answered with HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The data file cannot be turned into measurements.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data file: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{0}' is missing from the data file")]
    MissingColumn(&'static str),

    #[error("column '{column}' contains no numeric values ({rows} rows checked)")]
    NonNumericColumn { column: &'static str, rows: usize },
}
