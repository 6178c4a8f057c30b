//! Construction and Loading Adapters
//!
//! Every raw input is normalized to the same shape before it reaches the
//! engine: an ordered index (time values or strings to parse) and a mapping
//! of column name to values.
//!
//! - **Table sources**: anything implementing [`TableGetter`]
//! - **Table sinks**: anything implementing [`TableSetter`]
//! - **csv_rows**: delimited text with a header row
//! - **json_shapes**: nested JSON documents with an index array and columns
//!
//! Reading files is left to callers; these adapters work on text already in
//! memory.

mod csv_rows;
mod error;
mod json_shapes;

pub use csv_rows::CsvLoader;
pub use error::{LoaderError, LoaderResult};
pub use json_shapes::{load_json, JsonShape};

use crate::series::{
    parse_time_array, ChangeKind, SeriesError, SeriesResult, TimeSeries, TimeValue,
};
use std::collections::BTreeMap;

/// A tabular source of a time index and numeric columns
pub trait TableGetter {
    /// The time index
    fn get_index(&self) -> SeriesResult<Vec<TimeValue>>;

    /// Values of one column
    fn get(&self, column: &str) -> SeriesResult<Vec<f64>>;

    /// Names of the available columns
    fn list_columns(&self) -> Vec<String>;
}

/// A tabular sink accepting a time index and numeric columns
pub trait TableSetter {
    /// Replace the time index
    fn set_index(&mut self, index: &[TimeValue]) -> SeriesResult<()>;

    /// Replace one column
    fn set(&mut self, column: &str, values: &[f64]) -> SeriesResult<()>;
}

impl TableGetter for TimeSeries {
    fn get_index(&self) -> SeriesResult<Vec<TimeValue>> {
        Ok(TimeSeries::get_index(self).to_vec())
    }

    fn get(&self, column: &str) -> SeriesResult<Vec<f64>> {
        TimeSeries::get(self, column)
            .map(<[f64]>::to_vec)
            .ok_or_else(|| SeriesError::ColumnNotFound(column.to_string()))
    }

    fn list_columns(&self) -> Vec<String> {
        TimeSeries::list_columns(self)
    }
}

/// An index given either as time values or as strings to parse
#[derive(Debug, Clone, PartialEq)]
pub enum RawIndex {
    Times(Vec<TimeValue>),
    Strings(Vec<String>),
}

impl RawIndex {
    /// Resolve to time values
    pub fn into_times(self) -> SeriesResult<Vec<TimeValue>> {
        match self {
            RawIndex::Times(times) => Ok(times),
            RawIndex::Strings(strings) => parse_time_array(&strings),
        }
    }
}

impl From<Vec<TimeValue>> for RawIndex {
    fn from(times: Vec<TimeValue>) -> Self {
        RawIndex::Times(times)
    }
}

impl From<Vec<String>> for RawIndex {
    fn from(strings: Vec<String>) -> Self {
        RawIndex::Strings(strings)
    }
}

impl From<Vec<&str>> for RawIndex {
    fn from(strings: Vec<&str>) -> Self {
        RawIndex::Strings(strings.into_iter().map(str::to_string).collect())
    }
}

impl TimeSeries {
    /// Build a validated series from an index and a column mapping
    pub fn from_data<I, C, K>(index: I, columns: C) -> SeriesResult<TimeSeries>
    where
        I: Into<RawIndex>,
        C: IntoIterator<Item = (K, Vec<f64>)>,
        K: Into<String>,
    {
        let index = index.into().into_times()?;
        let columns: BTreeMap<String, Vec<f64>> =
            columns.into_iter().map(|(k, v)| (k.into(), v)).collect();

        let mut series = TimeSeries::from_parts(index, columns)?;
        series.record_committed(ChangeKind::Load, true);
        Ok(series)
    }

    /// Build a series by pulling the index and every listed column once
    pub fn from_getter<S: TableGetter + ?Sized>(source: &S) -> SeriesResult<TimeSeries> {
        let index = source.get_index()?;
        let columns = source
            .list_columns()
            .into_iter()
            .map(|name| {
                let values = source.get(&name)?;
                Ok((name, values))
            })
            .collect::<SeriesResult<Vec<_>>>()?;

        TimeSeries::from_data(index, columns)
    }

    /// Write the index, then every column, into a sink
    pub fn write_to_setter<D: TableSetter + ?Sized>(&self, sink: &mut D) -> SeriesResult<()> {
        sink.set_index(TimeSeries::get_index(self))?;
        for (name, values) in self.columns() {
            sink.set(name, values)?;
        }
        Ok(())
    }

    /// Temporally append a sequence of series, in order
    pub fn concat<I>(parts: I) -> SeriesResult<TimeSeries>
    where
        I: IntoIterator<Item = TimeSeries>,
    {
        let mut merged = TimeSeries::new();
        for part in parts {
            merged = merged.append(&part)?;
        }
        if !merged.is_empty() {
            merged.record_committed(ChangeKind::Load, true);
        }
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::parse_time;

    /// Row-store test double that only speaks the source/sink traits
    #[derive(Default)]
    struct MemoryTable {
        index: Vec<TimeValue>,
        columns: Vec<(String, Vec<f64>)>,
        fail_on: Option<String>,
    }

    impl TableGetter for MemoryTable {
        fn get_index(&self) -> SeriesResult<Vec<TimeValue>> {
            Ok(self.index.clone())
        }

        fn get(&self, column: &str) -> SeriesResult<Vec<f64>> {
            if self.fail_on.as_deref() == Some(column) {
                return Err(SeriesError::Source(format!("cannot read {}", column)));
            }
            self.columns
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, values)| values.clone())
                .ok_or_else(|| SeriesError::ColumnNotFound(column.to_string()))
        }

        fn list_columns(&self) -> Vec<String> {
            self.columns.iter().map(|(name, _)| name.clone()).collect()
        }
    }

    impl TableSetter for MemoryTable {
        fn set_index(&mut self, index: &[TimeValue]) -> SeriesResult<()> {
            self.index = index.to_vec();
            Ok(())
        }

        fn set(&mut self, column: &str, values: &[f64]) -> SeriesResult<()> {
            self.columns.push((column.to_string(), values.to_vec()));
            Ok(())
        }
    }

    fn sample() -> TimeSeries {
        let mut columns = BTreeMap::new();
        columns.insert("close", vec![1.0, 2.0]);
        columns.insert("volume", vec![10.0, 20.0]);
        TimeSeries::from_data(vec!["2021-01-01", "2021-01-02"], columns).unwrap()
    }

    #[test]
    fn test_from_data_with_strings() {
        let ts = sample();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.start().unwrap(), parse_time("2021-01-01").unwrap());

        let load = ts.changes().last().unwrap();
        assert_eq!(load.kind, ChangeKind::Load);
        assert!(load.committed);
    }

    #[test]
    fn test_from_data_rejects_bad_input() {
        let columns = vec![("close", vec![1.0])];
        assert!(matches!(
            TimeSeries::from_data(vec!["2021-01-01", "garbage"], columns.clone()),
            Err(SeriesError::Parse { .. })
        ));
        assert!(matches!(
            TimeSeries::from_data(vec!["2021-01-01", "2021-01-02"], columns),
            Err(SeriesError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_from_getter() {
        let table = MemoryTable {
            index: vec![parse_time("2021-01-01").unwrap()],
            columns: vec![("close".to_string(), vec![3.0])],
            fail_on: None,
        };
        let ts = TimeSeries::from_getter(&table).unwrap();
        assert_eq!(ts.get("close"), Some(&[3.0][..]));
    }

    #[test]
    fn test_from_getter_propagates_source_errors() {
        let table = MemoryTable {
            index: vec![parse_time("2021-01-01").unwrap()],
            columns: vec![("close".to_string(), vec![3.0])],
            fail_on: Some("close".to_string()),
        };
        assert!(matches!(
            TimeSeries::from_getter(&table),
            Err(SeriesError::Source(_))
        ));
    }

    #[test]
    fn test_series_is_a_table_source() {
        let ts = sample();
        let copy = TimeSeries::from_getter(&ts).unwrap();
        assert_eq!(copy, ts);
    }

    #[test]
    fn test_write_to_setter() {
        let ts = sample();
        let mut sink = MemoryTable::default();
        ts.write_to_setter(&mut sink).unwrap();

        assert_eq!(sink.index, ts.get_index());
        assert_eq!(sink.columns.len(), 2);
        let roundtrip = TimeSeries::from_getter(&sink).unwrap();
        assert_eq!(roundtrip, ts);
    }

    #[test]
    fn test_concat() {
        let first = sample();
        let mut columns = BTreeMap::new();
        columns.insert("close", vec![3.0]);
        columns.insert("volume", vec![30.0]);
        let second = TimeSeries::from_data(vec!["2021-01-03"], columns).unwrap();

        let merged = TimeSeries::concat(vec![first.clone(), second.clone()]).unwrap();
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("close"), Some(&[1.0, 2.0, 3.0][..]));

        assert!(TimeSeries::concat(vec![second, first]).is_err());
        assert!(TimeSeries::concat(Vec::new()).unwrap().is_empty());
    }
}
