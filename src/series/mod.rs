//! Chronoframe Series Engine
//!
//! This module provides the in-memory columnar time-series engine:
//!
//! - **time**: Date/time and interval parsing
//! - **aggregate**: Named reduction functions used by resampling
//! - **types**: Row, bound and change-log types
//! - **timeseries**: The `TimeSeries` table, validation, slicing, appending
//! - **transform**: Sort, map, filter, reduce
//! - **window**: Resample and split
//! - **error**: Error types
//!
//! # Invariants
//!
//! ```text
//! len(column) == len(index)           for every column
//! row i of every column  <->  index[i]
//! append: other.start() >= self.end() and identical column sets
//! max_size > 0: oldest rows dropped after every append
//! ```
//!
//! # Example
//!
//! ```rust
//! use chronoframe::series::{DataPoint, TimeSeries};
//!
//! let ts = TimeSeries::with_columns(&["close"])
//!     .append_point(&DataPoint::at("2021-01-01 00:00:00").unwrap().value("close", 1.0))
//!     .unwrap()
//!     .append_point(&DataPoint::at("2021-01-01 00:30:00").unwrap().value("close", 2.0))
//!     .unwrap();
//!
//! let tail = ts.slice_from(-1).unwrap();
//! assert_eq!(tail.get("close"), Some(&[2.0][..]));
//! ```

pub mod aggregate;
pub mod error;
pub mod time;
pub mod types;

mod timeseries;
mod transform;
mod window;

// Re-export commonly used types
pub use aggregate::{default_criteria, resolve_aggregators, Aggregator, AggregatorMap, Criteria};
pub use error::{SeriesError, SeriesResult};
pub use time::{parse_duration, parse_interval, parse_time, parse_time_array, TimeValue};
pub use timeseries::TimeSeries;
pub use types::{Bound, ChangeEntry, ChangeKind, DataPoint, ValidationWarning};
