//! Row-preserving transformations: sort, map, filter, reduce

use std::collections::BTreeMap;

use crate::series::error::{SeriesError, SeriesResult};
use crate::series::timeseries::TimeSeries;
use crate::series::types::ChangeKind;

impl TimeSeries {
    /// Stable sort of all rows, by a column's values or by index time
    pub fn sort(&self, by: Option<&str>) -> SeriesResult<TimeSeries> {
        let mut order: Vec<usize> = (0..self.len()).collect();

        match by {
            Some(column) => {
                let values = self.require(column)?;
                order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            }
            None => order.sort_by_key(|&p| self.index[p]),
        }

        Ok(self.take_rows(&order, ChangeKind::Sort))
    }

    /// Apply `f` to every value of the selected columns (all if `None`)
    ///
    /// The result holds only the mapped columns and carries no index, so it
    /// does not pass `validate` unless the series was empty. Unknown column
    /// names are skipped.
    pub fn map<F>(&self, f: F, columns: Option<&[&str]>) -> TimeSeries
    where
        F: Fn(f64) -> f64,
    {
        let selected = self.select(columns);
        let mapped: BTreeMap<String, Vec<f64>> = selected
            .into_iter()
            .filter_map(|name| {
                let values = self.columns.get(name)?;
                Some((name.to_string(), values.iter().map(|&v| f(v)).collect()))
            })
            .collect();

        tracing::debug!(columns = mapped.len(), "mapped columns without index");
        self.derive(Vec::new(), mapped, ChangeKind::Map)
    }

    /// Keep rows where `predicate` holds for every selected column
    ///
    /// The result keeps all columns, not only the selected ones.
    pub fn filter<P>(&self, predicate: P, columns: Option<&[&str]>) -> SeriesResult<TimeSeries>
    where
        P: Fn(f64) -> bool,
    {
        let selected = self
            .select(columns)
            .into_iter()
            .map(|name| self.require(name))
            .collect::<SeriesResult<Vec<_>>>()?;

        let keep: Vec<usize> = (0..self.len())
            .filter(|&row| selected.iter().all(|values| predicate(values[row])))
            .collect();

        Ok(self.take_rows(&keep, ChangeKind::Filter))
    }

    /// Keep row `i` iff `flags[i] == matching`
    ///
    /// Returns the matching rows and their offsets. A flag slice of the wrong
    /// length yields an empty series and no offsets.
    pub fn filter_by_truth_table(&self, flags: &[bool], matching: bool) -> (TimeSeries, Vec<usize>) {
        if flags.len() != self.len() {
            tracing::warn!(
                series_len = self.len(),
                flags_len = flags.len(),
                "cannot match truth table, unequal sizes"
            );
            return (TimeSeries::new(), Vec::new());
        }

        let keep: Vec<usize> = flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag == matching)
            .map(|(i, _)| i)
            .collect();

        (self.take_rows(&keep, ChangeKind::Filter), keep)
    }

    /// Left-fold a column, seeded with its first value
    pub fn reduce<F>(&self, f: F, column: &str) -> SeriesResult<f64>
    where
        F: Fn(f64, f64) -> f64,
    {
        let values = self.require(column)?;
        let (first, rest) = values.split_first().ok_or(SeriesError::EmptySeries)?;
        Ok(rest.iter().fold(*first, |acc, &v| f(acc, v)))
    }

    fn select<'a>(&'a self, columns: Option<&[&'a str]>) -> Vec<&'a str> {
        match columns {
            Some(names) => names.to_vec(),
            None => self.columns.keys().map(String::as_str).collect(),
        }
    }

    fn require(&self, column: &str) -> SeriesResult<&[f64]> {
        self.get(column)
            .ok_or_else(|| SeriesError::ColumnNotFound(column.to_string()))
    }
}
