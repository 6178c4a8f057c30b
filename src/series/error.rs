//! Time-series engine error types
//!
//! Defines all reported (recoverable) errors of the columnar engine.
//! Soft conditions such as validation warnings are logged, not returned.

use thiserror::Error;

/// Errors that can occur in the time-series engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeriesError {
    /// A date/time or duration string could not be parsed
    #[error("Parse error for '{input}': {reason}")]
    Parse { input: String, reason: String },

    /// Interval specifier is unknown or not usable
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// Aggregation criteria named a function that does not exist
    #[error("Could not resample field {column} by {function}: no such function")]
    UnknownAggregator { column: String, function: String },

    /// A column has no aggregation function assigned
    #[error("No aggregator for column: {0}")]
    MissingAggregator(String),

    /// Slice bound could not be resolved
    #[error("Invalid bound '{bound}': {reason}")]
    InvalidBound { bound: String, reason: String },

    /// Row offset outside the series
    #[error("Row offset {offset} out of range for series of length {len}")]
    OutOfRange { offset: i64, len: usize },

    /// Appended series starts before the receiver ends
    #[error("Append failed: appended series starts at {other_start} before receiver end {receiver_end}")]
    OutOfOrder {
        receiver_end: String,
        other_start: String,
    },

    /// Column sets of two series (or a series and a point) differ
    #[error("Field mismatch: {0}")]
    FieldMismatch(String),

    /// A column's length differs from the index length
    #[error("Column '{column}' has {found} values, index has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Requested column does not exist
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Operation needs more rows than the series holds
    #[error("Need at least {needed} rows, found {found}")]
    InsufficientRows { needed: usize, found: usize },

    /// Resample target interval is finer than the native sampling interval
    #[error("Cannot resample to interval {target} finer than native interval {native}")]
    IntervalTooFine { target: String, native: String },

    /// Operation is undefined on an empty series
    #[error("Series is empty")]
    EmptySeries,

    /// Batch size must be at least one
    #[error("Batch size must be greater than zero")]
    InvalidBatchSize,

    /// A table source or sink failed
    #[error("Table source error: {0}")]
    Source(String),
}

impl SeriesError {
    /// Build a parse error annotated with the failing input
    pub fn parse(input: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SeriesError::Parse {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for time-series operations
pub type SeriesResult<T> = Result<T, SeriesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SeriesError::UnknownAggregator {
            column: "close".to_string(),
            function: "median".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Could not resample field close by median: no such function"
        );

        let err = SeriesError::parse("2021-13-01", "input is out of range");
        assert_eq!(
            err.to_string(),
            "Parse error for '2021-13-01': input is out of range"
        );
    }

    #[test]
    fn test_length_mismatch_display() {
        let err = SeriesError::LengthMismatch {
            column: "open".to_string(),
            expected: 3,
            found: 2,
        };
        assert_eq!(err.to_string(), "Column 'open' has 2 values, index has 3");
    }
}
