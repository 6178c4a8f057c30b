//! Core data types for the columnar engine
//!
//! - `DataPoint`: one row (a time value and its column values)
//! - `Bound`: a slice/lookup position given as offset, time, or time string
//! - `ChangeEntry`: one record in a series' audit trail
//! - `ValidationWarning`: non-critical findings of `TimeSeries::validate`

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::series::error::SeriesResult;
use crate::series::time::{parse_time, TimeValue};

/// A single row of a time series
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataPoint {
    /// Time of the row
    pub index: TimeValue,
    /// Column name → value
    #[serde(default)]
    pub columns: BTreeMap<String, f64>,
}

impl DataPoint {
    /// Create a data point with no column values
    pub fn new(index: TimeValue) -> Self {
        Self {
            index,
            columns: BTreeMap::new(),
        }
    }

    /// Create a data point at a parsed time
    pub fn at(time: &str) -> SeriesResult<Self> {
        Ok(Self::new(parse_time(time)?))
    }

    /// Builder method: set a column value
    pub fn value(mut self, column: impl Into<String>, value: f64) -> Self {
        self.columns.insert(column.into(), value);
        self
    }

    /// Builder method: add multiple column values
    pub fn values(mut self, values: BTreeMap<String, f64>) -> Self {
        self.columns.extend(values);
        self
    }

    /// Get a column value
    pub fn get(&self, column: &str) -> Option<f64> {
        self.columns.get(column).copied()
    }
}

/// A position in a series, resolved to a row offset by the series
///
/// Integer offsets may be negative (counted from the end). Time bounds
/// resolve to the first row strictly after the given time.
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    /// Row offset
    Index(i64),
    /// Time value
    Time(TimeValue),
    /// Time string, parsed on resolution
    TimeString(String),
}

impl From<i64> for Bound {
    fn from(offset: i64) -> Self {
        Bound::Index(offset)
    }
}

impl From<i32> for Bound {
    fn from(offset: i32) -> Self {
        Bound::Index(offset as i64)
    }
}

impl From<usize> for Bound {
    fn from(offset: usize) -> Self {
        Bound::Index(offset as i64)
    }
}

impl From<TimeValue> for Bound {
    fn from(time: TimeValue) -> Self {
        Bound::Time(time)
    }
}

impl From<&str> for Bound {
    fn from(text: &str) -> Self {
        Bound::TimeString(text.to_string())
    }
}

impl From<String> for Bound {
    fn from(text: String) -> Self {
        Bound::TimeString(text)
    }
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bound::Index(i) => write!(f, "{}", i),
            Bound::Time(t) => write!(f, "{}", t),
            Bound::TimeString(s) => write!(f, "{}", s),
        }
    }
}

/// Kind of structural operation recorded in the change log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Load,
    Append,
    AppendPoint,
    Slice,
    Sort,
    Swap,
    Filter,
    Map,
    Resample,
    Split,
    Truncate,
    DropColumns,
}

/// One entry of the audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEntry {
    pub kind: ChangeKind,
    /// First time affected, if any rows were involved
    pub from: Option<TimeValue>,
    /// Last time affected
    pub to: Option<TimeValue>,
    /// Whether the change is known to be reflected in storage
    pub committed: bool,
}

/// Non-critical findings reported by validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationWarning {
    /// Index decreases at this row offset
    UnsortedIndex(usize),
    /// Same timestamp appears on consecutive rows
    DuplicateIndex(TimeValue),
    /// Column holds only zeroes
    ZeroColumn(String),
    /// Row holds only zeroes
    ZeroRow(TimeValue),
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsortedIndex(at) => write!(f, "unsorted time index at row {}: run sort()", at),
            Self::DuplicateIndex(t) => write!(f, "duplicate index keys found for {}", t),
            Self::ZeroColumn(c) => write!(f, "column {} is empty/all zeroes", c),
            Self::ZeroRow(t) => write!(f, "row at index {} is empty/all zeroes", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_point_builder() {
        let point = DataPoint::at("2021-01-01")
            .unwrap()
            .value("close", 1.5)
            .value("volume", 100.0);

        assert_eq!(point.get("close"), Some(1.5));
        assert_eq!(point.get("volume"), Some(100.0));
        assert_eq!(point.get("open"), None);
    }

    #[test]
    fn test_data_point_serialization() {
        let point = DataPoint::at("2021-01-01 10:00:00").unwrap().value("close", 2.0);
        let json = serde_json::to_string(&point).unwrap();
        let restored: DataPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(point, restored);
    }

    #[test]
    fn test_bound_conversions() {
        assert_eq!(Bound::from(-1), Bound::Index(-1));
        assert_eq!(Bound::from(3usize), Bound::Index(3));
        assert_eq!(
            Bound::from("2021-01-01"),
            Bound::TimeString("2021-01-01".to_string())
        );
    }

    #[test]
    fn test_warning_display() {
        let w = ValidationWarning::ZeroColumn("volume".to_string());
        assert_eq!(w.to_string(), "column volume is empty/all zeroes");
    }
}
