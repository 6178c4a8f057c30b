//! # Chronoframe
//!
//! Columnar time-indexed data engine: a table of equal-length numeric
//! columns keyed by one shared time index, with slicing, appending,
//! resampling, splitting and simple column transforms.
//!
//! ## Modules
//!
//! - [`series`]: Time parsing, aggregation registry and the `TimeSeries` engine
//! - [`loader`]: Table source/sink traits, delimited-row and JSON adapters
//! - [`config`]: TOML configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust
//! use chronoframe::loader::CsvLoader;
//!
//! let csv = "date,open,high,low,close,volume
//! 2021-01-01 00:00:00,1,2,0.5,1.5,10
//! 2021-01-01 00:30:00,1.5,3,1,2,20
//! 2021-01-01 01:00:00,2,2.5,1.5,2.5,30
//! 2021-01-01 01:30:00,2.5,4,2,3.5,40
//! ";
//!
//! let ts = CsvLoader::new().load_str(csv).unwrap();
//! let hourly = ts.resample("1h", None).unwrap();
//!
//! assert_eq!(hourly.len(), 2);
//! assert_eq!(hourly.get("volume"), Some(&[30.0, 70.0][..]));
//! ```

pub mod config;
pub mod loader;
pub mod series;

// Re-export top-level types for convenience
pub use series::{
    default_criteria, parse_duration, parse_interval, parse_time, Aggregator, Bound, Criteria,
    DataPoint, SeriesError, SeriesResult, TimeSeries, TimeValue, ValidationWarning,
};

pub use loader::{load_json, CsvLoader, JsonShape, LoaderError, LoaderResult, RawIndex, TableGetter, TableSetter};

pub use config::{Config, ConfigError, EngineConfig, LoggingConfig};
