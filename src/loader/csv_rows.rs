//! Delimited rows
//!
//! Normalizes header-first delimited text into an index and a column map.

use std::collections::BTreeMap;
use std::io::Read;

use crate::loader::error::{LoaderError, LoaderResult};
use crate::series::{parse_time, ChangeKind, TimeSeries, TimeValue};

/// Loader for delimited text with a header row
///
/// The first column whose lower-cased name contains `date` or `time` holds
/// the index; every other column is read as `f64`.
#[derive(Debug, Clone)]
pub struct CsvLoader {
    delimiter: u8,
    tail_rows: Option<usize>,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            tail_rows: None,
        }
    }

    /// Set the field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Keep only the last `n` data rows
    pub fn tail_rows(mut self, n: usize) -> Self {
        self.tail_rows = Some(n);
        self
    }

    /// Load from text already in memory
    pub fn load_str(&self, data: &str) -> LoaderResult<TimeSeries> {
        self.load_reader(data.as_bytes())
    }

    /// Load from any reader
    pub fn load_reader<R: Read>(&self, reader: R) -> LoaderResult<TimeSeries> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let index_column = match headers
            .iter()
            .position(|h| h.contains("date") || h.contains("time"))
        {
            Some(position) => position,
            None => {
                tracing::warn!(
                    headers = ?headers,
                    "no date or time column in header, using the first column as index"
                );
                0
            }
        };

        let mut index: Vec<TimeValue> = Vec::new();
        let mut columns: BTreeMap<String, Vec<f64>> = headers
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index_column)
            .map(|(_, name)| (name.clone(), Vec::new()))
            .collect();

        for (row, record) in reader.records().enumerate() {
            let record = record?;
            let line = row + 2;

            for (position, cell) in record.iter().enumerate() {
                let cell = cell.trim();
                let Some(name) = headers.get(position) else {
                    continue;
                };

                if position == index_column {
                    let time = parse_time(cell).map_err(|e| LoaderError::Parse {
                        line,
                        column: name.clone(),
                        reason: e.to_string(),
                    })?;
                    index.push(time);
                    continue;
                }

                let value = if cell.is_empty() {
                    0.0
                } else {
                    cell.parse::<f64>().map_err(|e| LoaderError::Parse {
                        line,
                        column: name.clone(),
                        reason: e.to_string(),
                    })?
                };
                if let Some(values) = columns.get_mut(name) {
                    values.push(value);
                }
            }
        }

        if index.is_empty() {
            tracing::error!("load failed, probably wrong schema provided");
            return Err(LoaderError::Empty);
        }

        if let Some(n) = self.tail_rows {
            let skip = index.len().saturating_sub(n);
            index.drain(..skip);
            for values in columns.values_mut() {
                let cut = skip.min(values.len());
                values.drain(..cut);
            }
        }

        tracing::debug!(rows = index.len(), columns = columns.len(), "loaded delimited rows");

        let mut series = TimeSeries::from_parts(index, columns)?;
        series.record_committed(ChangeKind::Load, true);
        Ok(series)
    }
}
