//! Aggregation Function Registry
//!
//! Maps symbolic reduction names to [`Aggregator`]s used by resampling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::series::error::{SeriesError, SeriesResult};

/// Column name → aggregation function name, as supplied by callers
pub type Criteria = BTreeMap<String, String>;

/// Column name → resolved aggregator
pub type AggregatorMap = BTreeMap<String, Aggregator>;

/// Reductions available when resampling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregator {
    /// First value in the window
    First,
    /// Last value in the window
    Last,
    /// Sum of values
    Sum,
    /// Minimum value
    Min,
    /// Maximum value
    Max,
    /// Arithmetic mean
    Mean,
    /// Deviation measure: square root of the mean of (value - mean)
    Sd,
}

impl Aggregator {
    /// Parse from the registry name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "first" => Some(Self::First),
            "last" => Some(Self::Last),
            "sum" => Some(Self::Sum),
            "min" => Some(Self::Min),
            "max" => Some(Self::Max),
            "mean" => Some(Self::Mean),
            "sd" => Some(Self::Sd),
            _ => None,
        }
    }

    /// Reduce a window of values; `None` for an empty window
    ///
    /// `Sd` sums the raw (unsquared) deviations before taking the root, so it
    /// is not the textbook standard deviation.
    pub fn apply(&self, values: &[f64]) -> Option<f64> {
        let first = *values.first()?;

        Some(match self {
            Self::First => first,
            Self::Last => *values.last()?,
            Self::Sum => values.iter().sum(),
            Self::Max => values.iter().fold(first, |acc, &v| if v > acc { v } else { acc }),
            Self::Min => values.iter().fold(first, |acc, &v| if v < acc { v } else { acc }),
            Self::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Self::Sd => {
                let n = values.len() as f64;
                let mean = values.iter().sum::<f64>() / n;
                let deviation: f64 = values.iter().map(|v| v - mean).sum();
                (deviation / n).sqrt()
            }
        })
    }
}

impl std::fmt::Display for Aggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::First => write!(f, "first"),
            Self::Last => write!(f, "last"),
            Self::Sum => write!(f, "sum"),
            Self::Min => write!(f, "min"),
            Self::Max => write!(f, "max"),
            Self::Mean => write!(f, "mean"),
            Self::Sd => write!(f, "sd"),
        }
    }
}

/// The OHLCV policy used when no criteria are given
pub fn default_criteria() -> Criteria {
    [
        ("open", "first"),
        ("high", "max"),
        ("low", "min"),
        ("close", "last"),
        ("volume", "sum"),
    ]
    .into_iter()
    .map(|(column, func)| (column.to_string(), func.to_string()))
    .collect()
}

/// Resolve criteria into aggregators, defaulting to the OHLCV policy
pub fn resolve_aggregators(criteria: Option<&Criteria>) -> SeriesResult<AggregatorMap> {
    let defaults;
    let criteria = match criteria {
        Some(c) => c,
        None => {
            defaults = default_criteria();
            &defaults
        }
    };

    criteria
        .iter()
        .map(|(column, func)| {
            Aggregator::from_name(func)
                .map(|agg| (column.clone(), agg))
                .ok_or_else(|| SeriesError::UnknownAggregator {
                    column: column.clone(),
                    function: func.clone(),
                })
        })
        .collect()
}
