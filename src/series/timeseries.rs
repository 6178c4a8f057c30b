//! The columnar TimeSeries
//!
//! A table of equal-length `f64` columns keyed by one shared time index.
//! Row `i` of every column belongs to `index[i]`.
//!
//! Every operation is value-semantic. Fallible operations (append, slicing,
//! row swap) take `&self` and return a new series; a failed call leaves its
//! inputs untouched. Only infallible builders (truncation, column dropping,
//! annotations) consume `self` and hand it back.

use chrono::Duration;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::series::error::{SeriesError, SeriesResult};
use crate::series::time::{parse_time, TimeValue};
use crate::series::types::{Bound, ChangeEntry, ChangeKind, DataPoint, ValidationWarning};

/// Columnar time-indexed table
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimeSeries {
    pub(super) index: Vec<TimeValue>,
    pub(super) columns: BTreeMap<String, Vec<f64>>,
    /// Row cap enforced after appends; 0 means uncapped
    pub(super) max_size: usize,
    pub(super) meta: BTreeMap<String, String>,
    #[serde(skip)]
    pub(super) changes: Vec<ChangeEntry>,
}

/// Two series are equal when they hold the same rows; annotations and
/// history are not compared.
impl PartialEq for TimeSeries {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.columns == other.columns
    }
}

impl TimeSeries {
    /// Create an empty series with no columns
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty accumulator that declares its columns
    pub fn with_columns<S: AsRef<str>>(names: &[S]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|n| (n.as_ref().to_string(), Vec::new()))
                .collect(),
            ..Self::default()
        }
    }

    /// Build a series from an index and columns, checking column lengths
    pub fn from_parts(
        index: Vec<TimeValue>,
        columns: BTreeMap<String, Vec<f64>>,
    ) -> SeriesResult<Self> {
        let series = Self {
            index,
            columns,
            ..Self::default()
        };
        series.validate(false)?;
        Ok(series)
    }

    /// Build a series from rows
    pub fn from_data_points(points: &[DataPoint]) -> SeriesResult<Self> {
        let mut series = Self::new();
        for point in points {
            series.index.push(point.index);
            for (name, value) in &point.columns {
                series.columns.entry(name.clone()).or_default().push(*value);
            }
        }
        series.validate(false)?;
        Ok(series)
    }

    /// Convert to rows
    pub fn to_data_points(&self) -> Vec<DataPoint> {
        (0..self.len()).filter_map(|i| self.row(i)).collect()
    }

    /// Split back into index and columns
    pub fn into_parts(self) -> (Vec<TimeValue>, BTreeMap<String, Vec<f64>>) {
        (self.index, self.columns)
    }

    // ---- accessors ----

    /// Number of rows
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// True if the series has no rows
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// First time in the index
    pub fn start(&self) -> SeriesResult<TimeValue> {
        self.index.first().copied().ok_or(SeriesError::EmptySeries)
    }

    /// Last time in the index
    pub fn end(&self) -> SeriesResult<TimeValue> {
        self.index.last().copied().ok_or(SeriesError::EmptySeries)
    }

    /// Native sampling interval: difference of the first two index entries
    pub fn interval(&self) -> SeriesResult<Duration> {
        match self.index.as_slice() {
            [first, second, ..] => Ok(*second - *first),
            _ => Err(SeriesError::InsufficientRows {
                needed: 2,
                found: self.len(),
            }),
        }
    }

    /// Values of one column
    pub fn get(&self, column: &str) -> Option<&[f64]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    /// The time index
    pub fn get_index(&self) -> &[TimeValue] {
        &self.index
    }

    /// All columns
    pub fn columns(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.columns
    }

    /// Column names in sorted order
    pub fn list_columns(&self) -> Vec<String> {
        self.columns.keys().cloned().collect()
    }

    /// Row cap, 0 when uncapped
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Free-form annotations
    pub fn meta(&self) -> &BTreeMap<String, String> {
        &self.meta
    }

    /// Builder: add an annotation
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Structural operations applied so far
    pub fn changes(&self) -> &[ChangeEntry] {
        &self.changes
    }

    /// Mark every recorded change as reflected in storage
    pub fn mark_committed(mut self) -> Self {
        for change in &mut self.changes {
            change.committed = true;
        }
        self
    }

    // ---- lookups ----

    /// Offset of the row at exactly `time`
    pub fn index_of_time(&self, time: TimeValue) -> Option<usize> {
        self.index.iter().position(|t| *t == time)
    }

    /// Offset of the row at the parsed time; `None` if absent or unparsable
    pub fn index_of_time_str(&self, text: &str) -> Option<usize> {
        match parse_time(text) {
            Ok(time) => self.index_of_time(time),
            Err(e) => {
                tracing::error!(error = %e, "could not find index at time");
                None
            }
        }
    }

    /// The row at a bound: offset (negative from the end) or exact time
    pub fn data_point_at(&self, at: impl Into<Bound>) -> Option<DataPoint> {
        let position = match at.into() {
            Bound::Index(i) if i < 0 => usize::try_from(self.len() as i64 + i).ok()?,
            Bound::Index(i) => usize::try_from(i).ok()?,
            Bound::Time(t) => self.index_of_time(t)?,
            Bound::TimeString(s) => self.index_of_time_str(&s)?,
        };
        self.row(position)
    }

    pub(super) fn row(&self, position: usize) -> Option<DataPoint> {
        let index = *self.index.get(position)?;
        let columns = self
            .columns
            .iter()
            .filter_map(|(name, values)| values.get(position).map(|v| (name.clone(), *v)))
            .collect();
        Some(DataPoint { index, columns })
    }

    // ---- validation ----

    /// Check column lengths, optionally collecting non-critical warnings
    ///
    /// A column whose length differs from the index is an error. With
    /// `check_non_critical`, an unsorted index, duplicate timestamps, all-zero
    /// columns and all-zero rows are logged and returned as warnings.
    pub fn validate(&self, check_non_critical: bool) -> SeriesResult<Vec<ValidationWarning>> {
        for (name, values) in &self.columns {
            if values.len() != self.index.len() {
                return Err(SeriesError::LengthMismatch {
                    column: name.clone(),
                    expected: self.index.len(),
                    found: values.len(),
                });
            }
        }

        let mut warnings = Vec::new();
        if !check_non_critical {
            return Ok(warnings);
        }

        let mut unsorted_reported = false;
        for (k, pair) in self.index.windows(2).enumerate() {
            if pair[1] < pair[0] && !unsorted_reported {
                warnings.push(ValidationWarning::UnsortedIndex(k + 1));
                unsorted_reported = true;
            }
            if pair[1] == pair[0] {
                warnings.push(ValidationWarning::DuplicateIndex(pair[1]));
            }
        }

        for (name, values) in &self.columns {
            if values.iter().all(|v| *v == 0.0) {
                warnings.push(ValidationWarning::ZeroColumn(name.clone()));
            }
        }

        if !self.columns.is_empty() {
            for (k, time) in self.index.iter().enumerate() {
                if self.columns.values().all(|values| values[k] == 0.0) {
                    warnings.push(ValidationWarning::ZeroRow(*time));
                }
            }
        }

        for warning in &warnings {
            tracing::warn!("validation warning: {}", warning);
        }

        Ok(warnings)
    }

    // ---- slicing ----

    /// Slice from `lower` to the end of the series
    pub fn slice_from(&self, lower: impl Into<Bound>) -> SeriesResult<TimeSeries> {
        self.slice(lower, -1)
    }

    /// Select a contiguous range of rows
    ///
    /// Integer bounds may be negative: a negative lower bound counts from the
    /// end, a negative upper bound is inclusive of the referenced row (so `-1`
    /// means "through the last row"). Time bounds resolve to the first row
    /// strictly after the given time. Bounds given in reverse are swapped.
    pub fn slice(
        &self,
        lower: impl Into<Bound>,
        upper: impl Into<Bound>,
    ) -> SeriesResult<TimeSeries> {
        let len = self.len() as i64;
        let mut lo = self.resolve_bound(&lower.into())?;
        let mut hi = self.resolve_bound(&upper.into())?;

        if lo < 0 {
            lo += len;
        }
        if hi < 0 {
            hi += len + 1;
        }
        if lo > hi {
            std::mem::swap(&mut lo, &mut hi);
        }
        if lo < 0 {
            return Err(SeriesError::OutOfRange { offset: lo, len: self.len() });
        }
        if hi > len {
            return Err(SeriesError::OutOfRange { offset: hi, len: self.len() });
        }

        let (lo, hi) = (lo as usize, hi as usize);
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), values[lo..hi].to_vec()))
            .collect();

        Ok(self.derive(self.index[lo..hi].to_vec(), columns, ChangeKind::Slice))
    }

    /// Resolve a bound to a raw (possibly negative) row offset
    fn resolve_bound(&self, bound: &Bound) -> SeriesResult<i64> {
        match bound {
            Bound::Index(i) => Ok(*i),
            Bound::Time(t) => Ok(self.first_after(*t) as i64),
            Bound::TimeString(s) => {
                let t = parse_time(s).map_err(|e| SeriesError::InvalidBound {
                    bound: s.clone(),
                    reason: e.to_string(),
                })?;
                Ok(self.first_after(t) as i64)
            }
        }
    }

    /// Offset of the first row strictly after `time`, or `len` if none
    fn first_after(&self, time: TimeValue) -> usize {
        self.index
            .iter()
            .position(|t| *t > time)
            .unwrap_or(self.index.len())
    }

    // ---- appending ----

    /// Append another series that starts no earlier than this one ends
    ///
    /// Both series must have exactly the same columns. The row cap is applied
    /// to the combined series. Neither input is changed, so a rejected
    /// append leaves the receiver usable.
    pub fn append(&self, other: &TimeSeries) -> SeriesResult<TimeSeries> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }

        let receiver_end = self.end()?;
        let other_start = other.start()?;
        if other_start < receiver_end {
            tracing::error!(%receiver_end, %other_start, "append failed: series out of order");
            return Err(SeriesError::OutOfOrder {
                receiver_end: receiver_end.to_string(),
                other_start: other_start.to_string(),
            });
        }

        if self.columns.len() != other.columns.len()
            || self.columns.keys().any(|k| !other.columns.contains_key(k))
        {
            let missing: Vec<&str> = self
                .columns
                .keys()
                .filter(|k| !other.columns.contains_key(*k))
                .chain(other.columns.keys().filter(|k| !self.columns.contains_key(*k)))
                .map(String::as_str)
                .collect();
            return Err(SeriesError::FieldMismatch(format!(
                "append failed: columns differ between series: {}",
                missing.join(", ")
            )));
        }
        other.validate(false)?;

        let mut series = self.clone();
        series.index.extend_from_slice(&other.index);
        for (name, values) in series.columns.iter_mut() {
            if let Some(appended) = other.columns.get(name) {
                values.extend_from_slice(appended);
            }
        }
        series.changes.push(ChangeEntry {
            kind: ChangeKind::Append,
            from: Some(other_start),
            to: other.end().ok(),
            committed: false,
        });

        let cap = series.max_size;
        let series = series.set_max_size(cap);
        series.validate(false)?;
        Ok(series)
    }

    /// Append a single row
    ///
    /// The point must carry exactly the columns declared on the series. The
    /// receiver is left unchanged.
    pub fn append_point(&self, point: &DataPoint) -> SeriesResult<TimeSeries> {
        if let Some(unknown) = point.columns.keys().find(|k| !self.columns.contains_key(*k)) {
            return Err(SeriesError::FieldMismatch(format!(
                "failed to append data point to series: column `{}` not in series",
                unknown
            )));
        }
        if let Some((missing, values)) = self
            .columns
            .iter()
            .find(|(name, _)| !point.columns.contains_key(*name))
        {
            return Err(SeriesError::LengthMismatch {
                column: missing.clone(),
                expected: self.len() + 1,
                found: values.len(),
            });
        }

        let mut series = self.clone();
        series.index.push(point.index);
        for (name, value) in &point.columns {
            if let Some(values) = series.columns.get_mut(name) {
                values.push(*value);
            }
        }
        series.changes.push(ChangeEntry {
            kind: ChangeKind::AppendPoint,
            from: Some(point.index),
            to: Some(point.index),
            committed: false,
        });

        let cap = series.max_size;
        let series = series.set_max_size(cap);
        series.validate(false)?;
        Ok(series)
    }

    /// Cap the series at `size` rows, dropping the oldest
    ///
    /// A size of 0 removes the cap.
    pub fn set_max_size(mut self, size: usize) -> TimeSeries {
        self.max_size = size;
        if size == 0 || self.len() <= size {
            return self;
        }

        let drop = self.len() - size;
        let from = self.index.first().copied();
        let to = self.index.get(drop - 1).copied();
        self.index.drain(..drop);
        for values in self.columns.values_mut() {
            let n = drop.min(values.len());
            values.drain(..n);
        }
        self.changes.push(ChangeEntry {
            kind: ChangeKind::Truncate,
            from,
            to,
            committed: false,
        });
        self
    }

    // ---- row/column maintenance ----

    /// Swap two rows across the index and all columns
    pub fn swap(&self, i: usize, j: usize) -> SeriesResult<TimeSeries> {
        for offset in [i, j] {
            if offset >= self.len() {
                return Err(SeriesError::OutOfRange {
                    offset: offset as i64,
                    len: self.len(),
                });
            }
        }

        let mut order: Vec<usize> = (0..self.len()).collect();
        order.swap(i, j);
        Ok(self.take_rows(&order, ChangeKind::Swap))
    }

    /// Remove columns that hold no values
    pub fn drop_empty_columns(mut self) -> TimeSeries {
        let before = self.columns.len();
        self.columns.retain(|_, values| !values.is_empty());
        if self.columns.len() != before {
            self.record(ChangeKind::DropColumns);
        }
        self
    }

    // ---- internal helpers ----

    /// New series sharing this one's annotations, cap and history
    pub(super) fn derive(
        &self,
        index: Vec<TimeValue>,
        columns: BTreeMap<String, Vec<f64>>,
        kind: ChangeKind,
    ) -> TimeSeries {
        let mut series = TimeSeries {
            index,
            columns,
            max_size: self.max_size,
            meta: self.meta.clone(),
            changes: self.changes.clone(),
        };
        series.record(kind);
        series
    }

    /// New series holding the given rows, in the given order
    pub(super) fn take_rows(&self, positions: &[usize], kind: ChangeKind) -> TimeSeries {
        let index = positions.iter().map(|&p| self.index[p]).collect();
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), positions.iter().map(|&p| values[p]).collect()))
            .collect();
        self.derive(index, columns, kind)
    }

    pub(super) fn record(&mut self, kind: ChangeKind) {
        self.record_committed(kind, false);
    }

    pub(crate) fn record_committed(&mut self, kind: ChangeKind, committed: bool) {
        self.changes.push(ChangeEntry {
            kind,
            from: self.index.first().copied(),
            to: self.index.last().copied(),
            committed,
        });
    }
}
