//! Loader error types

use thiserror::Error;

use crate::series::SeriesError;

/// Errors that can occur while normalizing raw rows into a series
#[derive(Error, Debug)]
pub enum LoaderError {
    /// The engine rejected the normalized data
    #[error("Series error: {0}")]
    Series(#[from] SeriesError),

    /// Delimited text could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON document could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A cell could not be converted
    #[error("Parse error at line {line}, column '{column}': {reason}")]
    Parse {
        line: usize,
        column: String,
        reason: String,
    },

    /// JSON shape name is not recognized
    #[error("Unknown JSON shape: {0}")]
    UnknownShape(String),

    /// Nothing was loaded
    #[error("Load failed, probably wrong schema provided")]
    Empty,
}

/// Result type alias for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;
