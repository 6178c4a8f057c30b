//! Window operations: resample and the split family
//!
//! `resample` and `split` share one sliding-window walk over the rows. A
//! window starts at row `head` and collects rows while their time is before
//! `index[head] + interval`; the first row at or past that boundary closes
//! the window and starts the next one. Windows are labelled with the time
//! of their first row, not with a grid-aligned boundary.
//!
//! ```text
//! rows:     00:00 00:15 00:30 00:45 | 01:00
//! interval: 1h
//! windows:  [------- 00:00 --------] [01:00]  (trailing)
//! ```
//!
//! `resample` reduces the trailing window too; `split` returns only windows
//! closed by a boundary row.

use chrono::Duration;
use std::collections::BTreeMap;
use std::ops::Range;

use crate::series::aggregate::{resolve_aggregators, Criteria};
use crate::series::error::{SeriesError, SeriesResult};
use crate::series::time::parse_interval;
use crate::series::timeseries::TimeSeries;
use crate::series::types::ChangeKind;

impl TimeSeries {
    /// Downsample to `target_interval`, reducing each window per column
    ///
    /// `criteria` maps column names to aggregator names; without it the OHLCV
    /// policy applies. Every column of the series needs an aggregator.
    /// Criteria for columns the series does not have are ignored.
    ///
    /// # Example
    ///
    /// ```rust
    /// use chronoframe::series::{Criteria, TimeSeries};
    /// use chronoframe::loader::RawIndex;
    /// use std::collections::BTreeMap;
    ///
    /// let index = RawIndex::from(vec!["2021-01-01 00:00:00", "2021-01-01 00:30:00", "2021-01-01 01:00:00"]);
    /// let mut columns = BTreeMap::new();
    /// columns.insert("close".to_string(), vec![1.0, 2.0, 3.0]);
    /// let ts = TimeSeries::from_data(index, columns).unwrap();
    ///
    /// let mut criteria = Criteria::new();
    /// criteria.insert("close".to_string(), "last".to_string());
    /// let hourly = ts.resample("1h", Some(&criteria)).unwrap();
    /// assert_eq!(hourly.get("close"), Some(&[2.0, 3.0][..]));
    /// ```
    pub fn resample(
        &self,
        target_interval: &str,
        criteria: Option<&Criteria>,
    ) -> SeriesResult<TimeSeries> {
        if self.len() < 2 {
            return Err(SeriesError::InsufficientRows {
                needed: 2,
                found: self.len(),
            });
        }

        let target = positive_interval(target_interval)?;
        let aggregators = resolve_aggregators(criteria)?;

        let native = self.interval()?;
        if target < native {
            return Err(SeriesError::IntervalTooFine {
                target: target.to_string(),
                native: native.to_string(),
            });
        }

        if let Some(missing) = self.columns.keys().find(|c| !aggregators.contains_key(*c)) {
            return Err(SeriesError::MissingAggregator(missing.clone()));
        }

        let (mut windows, trailing) = self.walk_windows(target);
        if !trailing.is_empty() {
            windows.push(trailing);
        }

        let index = windows.iter().map(|w| self.index[w.start]).collect();
        let mut columns = BTreeMap::new();
        for (name, values) in &self.columns {
            let agg = aggregators[name];
            let reduced = windows
                .iter()
                .map(|w| agg.apply(&values[w.clone()]).unwrap_or(f64::NAN))
                .collect();
            columns.insert(name.clone(), reduced);
        }

        tracing::debug!(
            rows_in = self.len(),
            rows_out = windows.len(),
            interval = %target,
            "resampled series"
        );
        Ok(self.derive(index, columns, ChangeKind::Resample))
    }

    /// Split into consecutive windows of `interval`, rows unaggregated
    ///
    /// Only windows closed by a later row are returned; the trailing, still
    /// open window is dropped whatever its size.
    pub fn split(&self, interval: &str) -> SeriesResult<Vec<TimeSeries>> {
        let duration = positive_interval(interval)?;
        let (windows, _trailing) = self.walk_windows(duration);

        Ok(windows
            .into_iter()
            .map(|w| self.range_rows(w, ChangeKind::Split))
            .collect())
    }

    /// Split into chunks of at most `batch_size` rows
    pub fn split_by_batch_size(&self, batch_size: usize) -> SeriesResult<Vec<TimeSeries>> {
        if batch_size == 0 {
            return Err(SeriesError::InvalidBatchSize);
        }

        Ok((0..self.len())
            .step_by(batch_size)
            .map(|start| {
                let end = (start + batch_size).min(self.len());
                self.range_rows(start..end, ChangeKind::Split)
            })
            .collect())
    }

    /// Split into runs of rows that share a calendar date
    ///
    /// Rows are grouped by full date, not by day of month, so rows exactly a
    /// month apart land in separate runs. The last run closes at the end of
    /// the data like any other; a lone final row on a new date is its own
    /// run rather than being folded into the previous one.
    pub fn split_by_day(&self) -> Vec<TimeSeries> {
        let mut runs = Vec::new();
        let mut start = 0;
        for k in 1..self.len() {
            if self.index[k].date() != self.index[k - 1].date() {
                runs.push(start..k);
                start = k;
            }
        }
        if !self.is_empty() {
            runs.push(start..self.len());
        }

        runs.into_iter()
            .map(|r| self.range_rows(r, ChangeKind::Split))
            .collect()
    }

    /// Completed windows plus the trailing, still open window
    fn walk_windows(&self, interval: Duration) -> (Vec<Range<usize>>, Range<usize>) {
        let mut windows = Vec::new();
        let (mut head, mut tail) = (0, 0);

        while tail < self.index.len() {
            let before_boundary = match self.index[head].checked_add_signed(interval) {
                Some(boundary) => self.index[tail] < boundary,
                None => true,
            };

            if before_boundary {
                tail += 1;
            } else if tail == head {
                head += 1;
                tail += 1;
            } else {
                windows.push(head..tail);
                head = tail;
            }
        }

        (windows, head..tail)
    }

    fn range_rows(&self, rows: Range<usize>, kind: ChangeKind) -> TimeSeries {
        let columns = self
            .columns
            .iter()
            .map(|(name, values)| (name.clone(), values[rows.clone()].to_vec()))
            .collect();
        self.derive(self.index[rows].to_vec(), columns, kind)
    }
}

fn positive_interval(spec: &str) -> SeriesResult<Duration> {
    let duration = parse_interval(spec, false)?;
    if duration <= Duration::zero() {
        return Err(SeriesError::InvalidInterval(format!(
            "interval '{}' must be positive",
            spec
        )));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::time::{parse_time, TimeValue};
    use crate::series::timeseries::tests::quarter_hours;

    fn t(s: &str) -> TimeValue {
        parse_time(s).unwrap()
    }

    fn criteria(pairs: &[(&str, &str)]) -> Criteria {
        pairs
            .iter()
            .map(|(c, f)| (c.to_string(), f.to_string()))
            .collect()
    }

    fn close_only(times: &[&str], close: &[f64]) -> TimeSeries {
        let mut columns = BTreeMap::new();
        columns.insert("close".to_string(), close.to_vec());
        TimeSeries::from_parts(times.iter().map(|s| t(s)).collect(), columns).unwrap()
    }

    #[test]
    fn test_resample_hourly_last() {
        let ts = close_only(
            &[
                "2021-01-01 00:00:00",
                "2021-01-01 00:15:00",
                "2021-01-01 00:30:00",
                "2021-01-01 00:45:00",
                "2021-01-01 01:00:00",
            ],
            &[1.0, 2.0, 3.0, 4.0, 5.0],
        );

        let hourly = ts
            .resample("1h", Some(&criteria(&[("close", "last")])))
            .unwrap();

        assert_eq!(
            hourly.get_index(),
            &[t("2021-01-01 00:00:00"), t("2021-01-01 01:00:00")][..]
        );
        assert_eq!(hourly.get("close"), Some(&[4.0, 5.0][..]));
    }

    #[test]
    fn test_resample_multiple_columns() {
        let hourly = quarter_hours()
            .resample("hour", Some(&criteria(&[("close", "mean"), ("volume", "sum")])))
            .unwrap();

        assert_eq!(hourly.get("close"), Some(&[2.5, 5.0][..]));
        assert_eq!(hourly.get("volume"), Some(&[100.0, 50.0][..]));
        assert_eq!(
            hourly.changes().last().map(|c| c.kind),
            Some(ChangeKind::Resample)
        );
    }

    #[test]
    fn test_resample_native_interval_is_identity() {
        let ts = close_only(
            &["2021-01-01 00:00:00", "2021-01-01 00:15:00", "2021-01-01 00:30:00"],
            &[7.0, 3.0, 9.0],
        );

        for func in ["first", "last", "min", "max", "mean", "sum"] {
            let out = ts.resample("15m", Some(&criteria(&[("close", func)]))).unwrap();
            assert_eq!(out, ts, "aggregator {}", func);
        }

        let sd = ts.resample("15m", Some(&criteria(&[("close", "sd")]))).unwrap();
        assert_eq!(sd.get("close"), Some(&[0.0, 0.0, 0.0][..]));
    }

    #[test]
    fn test_resample_default_ohlcv_policy() {
        let times = [
            "2021-01-01 00:00:00",
            "2021-01-01 00:30:00",
            "2021-01-01 01:00:00",
            "2021-01-01 01:30:00",
        ];
        let mut columns = BTreeMap::new();
        columns.insert("open".to_string(), vec![1.0, 2.0, 3.0, 4.0]);
        columns.insert("high".to_string(), vec![5.0, 9.0, 6.0, 7.0]);
        columns.insert("low".to_string(), vec![0.5, 0.1, 2.0, 1.5]);
        columns.insert("close".to_string(), vec![2.0, 3.0, 4.0, 5.0]);
        columns.insert("volume".to_string(), vec![10.0, 20.0, 30.0, 40.0]);
        let ts = TimeSeries::from_parts(times.iter().map(|s| t(s)).collect(), columns).unwrap();

        let hourly = ts.resample("1h", None).unwrap();
        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly.get("open"), Some(&[1.0, 3.0][..]));
        assert_eq!(hourly.get("high"), Some(&[9.0, 7.0][..]));
        assert_eq!(hourly.get("low"), Some(&[0.1, 1.5][..]));
        assert_eq!(hourly.get("close"), Some(&[3.0, 5.0][..]));
        assert_eq!(hourly.get("volume"), Some(&[30.0, 70.0][..]));
    }

    #[test]
    fn test_resample_rejections() {
        let ts = quarter_hours();

        let single = ts.slice(0, 1).unwrap();
        assert!(matches!(
            single.resample("1h", None),
            Err(SeriesError::InsufficientRows { needed: 2, found: 1 })
        ));

        assert!(matches!(
            ts.resample("5m", Some(&criteria(&[("close", "last"), ("volume", "sum")]))),
            Err(SeriesError::IntervalTooFine { .. })
        ));

        assert!(matches!(
            ts.resample("1h", Some(&criteria(&[("close", "median")]))),
            Err(SeriesError::UnknownAggregator { .. })
        ));

        assert!(matches!(
            ts.resample("1h", Some(&criteria(&[("close", "last")]))),
            Err(SeriesError::MissingAggregator(column)) if column == "volume"
        ));

        assert!(matches!(
            ts.resample("13months", None),
            Err(SeriesError::InvalidInterval(_))
        ));

        assert!(matches!(
            ts.resample("0h", None),
            Err(SeriesError::InvalidInterval(_))
        ));
    }

    #[test]
    fn test_split_by_interval() {
        let ts = quarter_hours();

        // trailing window is dropped
        let hourly = ts.split("1h").unwrap();
        assert_eq!(hourly.len(), 1);
        assert_eq!(hourly[0].len(), 4);
        assert_eq!(hourly[0].get("volume"), Some(&[10.0, 20.0, 30.0, 40.0][..]));

        let half_hours = ts.split("30m").unwrap();
        assert_eq!(half_hours.len(), 2);
        assert!(half_hours.iter().all(|s| s.len() == 2));
        assert_eq!(half_hours[1].start().unwrap(), t("2021-01-01 00:30:00"));
    }

    #[test]
    fn test_split_drops_multi_row_trailing_window() {
        let ts = close_only(
            &[
                "2021-01-01 00:00:00",
                "2021-01-01 00:15:00",
                "2021-01-01 00:30:00",
                "2021-01-01 00:45:00",
                "2021-01-01 01:00:00",
                "2021-01-01 01:15:00",
            ],
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        );

        let parts = ts.split("1h").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].get("close"), Some(&[1.0, 2.0, 3.0, 4.0][..]));
    }

    #[test]
    fn test_resample_leading_gap() {
        let ts = close_only(
            &["2021-01-01 00:00:00", "2021-01-01 02:00:00", "2021-01-01 02:15:00"],
            &[1.0, 2.0, 3.0],
        );
        let last = criteria(&[("close", "last")]);

        // the first gap is the native interval, so 1h is finer than it
        assert!(matches!(
            ts.resample("1h", Some(&last)),
            Err(SeriesError::IntervalTooFine { .. })
        ));

        // the lone leading row closes its own window and is kept
        let out = ts.resample("2h", Some(&last)).unwrap();
        assert_eq!(
            out.get_index(),
            &[t("2021-01-01 00:00:00"), t("2021-01-01 02:00:00")][..]
        );
        assert_eq!(out.get("close"), Some(&[1.0, 3.0][..]));
    }

    #[test]
    fn test_resample_gap_after_first_window() {
        let ts = close_only(
            &[
                "2021-01-01 00:00:00",
                "2021-01-01 00:30:00",
                "2021-01-01 02:00:00",
                "2021-01-01 02:15:00",
            ],
            &[1.0, 2.0, 3.0, 4.0],
        );

        let out = ts.resample("1h", Some(&criteria(&[("close", "sum")]))).unwrap();
        assert_eq!(
            out.get_index(),
            &[t("2021-01-01 00:00:00"), t("2021-01-01 02:00:00")][..]
        );
        assert_eq!(out.get("close"), Some(&[3.0, 7.0][..]));
    }

    #[test]
    fn test_split_leading_gap() {
        let ts = close_only(
            &["2021-01-01 00:00:00", "2021-01-01 02:00:00", "2021-01-01 02:15:00"],
            &[1.0, 2.0, 3.0],
        );

        // the leading row forms a closed window; the open 02:00 window is dropped
        let parts = ts.split("1h").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].get_index(), &[t("2021-01-01 00:00:00")][..]);
        assert_eq!(parts[0].get("close"), Some(&[1.0][..]));
    }

    #[test]
    fn test_split_by_batch_size() {
        let ts = quarter_hours();

        let batches = ts.split_by_batch_size(2).unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 2);
        assert_eq!(batches[2].len(), 1);
        assert_eq!(batches[2].get("close"), Some(&[5.0][..]));

        assert_eq!(ts.split_by_batch_size(5).unwrap().len(), 1);
        assert_eq!(ts.split_by_batch_size(7).unwrap().len(), 1);
        assert!(TimeSeries::new().split_by_batch_size(3).unwrap().is_empty());
        assert_eq!(ts.split_by_batch_size(0), Err(SeriesError::InvalidBatchSize));
    }

    #[test]
    fn test_split_by_day() {
        let ts = close_only(
            &[
                "2021-01-01 22:00:00",
                "2021-01-01 23:00:00",
                "2021-01-02 00:00:00",
                "2021-01-02 01:00:00",
                "2021-01-03 00:00:00",
            ],
            &[1.0, 2.0, 3.0, 4.0, 5.0],
        );

        let days = ts.split_by_day();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].get("close"), Some(&[1.0, 2.0][..]));
        assert_eq!(days[1].get("close"), Some(&[3.0, 4.0][..]));
        assert_eq!(days[2].get("close"), Some(&[5.0][..]));

        assert!(TimeSeries::new().split_by_day().is_empty());
        assert_eq!(ts.slice(0, 1).unwrap().split_by_day().len(), 1);
    }

    #[test]
    fn test_split_by_day_uses_full_date() {
        let ts = close_only(
            &["2021-01-05 10:00:00", "2021-02-05 10:00:00", "2021-03-05 10:00:00"],
            &[1.0, 2.0, 3.0],
        );

        let days = ts.split_by_day();
        assert_eq!(days.len(), 3);
        assert!(days.iter().all(|d| d.len() == 1));
    }
}
