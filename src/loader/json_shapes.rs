//! Nested JSON documents
//!
//! Each shape names where the index array and the value columns live.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::loader::error::{LoaderError, LoaderResult};
use crate::series::{parse_time_array, ChangeKind, TimeSeries};

/// Recognized JSON document layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonShape {
    /// `{"index": [...], "columns": {name: [...]}}`
    #[default]
    Split,
    /// `{"TimeIndex": [...], "Columns": {name: [...]}}`
    Split0,
    /// `{"timestamp": [...], "columns": {name: [...]}}`
    Split1,
    /// `{"Date": [...], "Open": [...], "High": ..., "Volume": [...]}`
    Yahoo,
    /// `{"timestamp": [...], "open": [...], "high": ..., "volume": [...]}`
    Generic,
}

impl FromStr for JsonShape {
    type Err = LoaderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "split" => Ok(JsonShape::Split),
            "split0" => Ok(JsonShape::Split0),
            "split1" => Ok(JsonShape::Split1),
            "yahoo" => Ok(JsonShape::Yahoo),
            "generic" => Ok(JsonShape::Generic),
            _ => Err(LoaderError::UnknownShape(s.to_string())),
        }
    }
}

impl fmt::Display for JsonShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JsonShape::Split => "split",
            JsonShape::Split0 => "split0",
            JsonShape::Split1 => "split1",
            JsonShape::Yahoo => "yahoo",
            JsonShape::Generic => "generic",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SplitDoc {
    index: Vec<String>,
    columns: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Split0Doc {
    #[serde(rename = "TimeIndex")]
    index: Vec<String>,
    #[serde(rename = "Columns")]
    columns: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Split1Doc {
    timestamp: Vec<String>,
    columns: BTreeMap<String, Vec<f64>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct YahooDoc {
    date: Vec<String>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenericDoc {
    timestamp: Vec<String>,
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
}

/// OHLCV arrays as lower-case columns; absent arrays are left out
fn ohlcv_columns(
    open: Vec<f64>,
    high: Vec<f64>,
    low: Vec<f64>,
    close: Vec<f64>,
    volume: Vec<f64>,
) -> BTreeMap<String, Vec<f64>> {
    [
        ("open", open),
        ("high", high),
        ("low", low),
        ("close", close),
        ("volume", volume),
    ]
    .into_iter()
    .filter(|(_, values)| !values.is_empty())
    .map(|(name, values)| (name.to_string(), values))
    .collect()
}

/// Load a JSON document of the given shape
pub fn load_json(text: &str, shape: JsonShape) -> LoaderResult<TimeSeries> {
    let (dates, columns) = match shape {
        JsonShape::Split => {
            let doc: SplitDoc = serde_json::from_str(text)?;
            (doc.index, doc.columns)
        }
        JsonShape::Split0 => {
            let doc: Split0Doc = serde_json::from_str(text)?;
            (doc.index, doc.columns)
        }
        JsonShape::Split1 => {
            let doc: Split1Doc = serde_json::from_str(text)?;
            (doc.timestamp, doc.columns)
        }
        JsonShape::Yahoo => {
            let doc: YahooDoc = serde_json::from_str(text)?;
            let columns = ohlcv_columns(doc.open, doc.high, doc.low, doc.close, doc.volume);
            (doc.date, columns)
        }
        JsonShape::Generic => {
            let doc: GenericDoc = serde_json::from_str(text)?;
            let columns = ohlcv_columns(doc.open, doc.high, doc.low, doc.close, doc.volume);
            (doc.timestamp, columns)
        }
    };

    if dates.is_empty() {
        tracing::error!(%shape, "load failed, probably wrong schema provided");
        return Err(LoaderError::Empty);
    }

    let index = parse_time_array(&dates)?;
    tracing::debug!(%shape, rows = index.len(), columns = columns.len(), "loaded json document");

    let mut series = TimeSeries::from_parts(index, columns)?;
    series.record_committed(ChangeKind::Load, true);
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::{parse_time, SeriesError};

    #[test]
    fn test_shape_names() {
        assert_eq!("split".parse::<JsonShape>().unwrap(), JsonShape::Split);
        assert_eq!("Yahoo".parse::<JsonShape>().unwrap(), JsonShape::Yahoo);
        assert_eq!(JsonShape::Split0.to_string(), "split0");
        assert!(matches!(
            "parquet".parse::<JsonShape>(),
            Err(LoaderError::UnknownShape(_))
        ));
    }

    #[test]
    fn test_load_split() {
        let text = r#"{
            "index": ["2021-01-01", "2021-01-02"],
            "columns": {"close": [1.0, 2.0], "volume": [5.0, 6.0]}
        }"#;
        let ts = load_json(text, JsonShape::Split).unwrap();
        assert_eq!(ts.len(), 2);
        assert_eq!(ts.get("volume"), Some(&[5.0, 6.0][..]));
    }

    #[test]
    fn test_load_split0_and_split1() {
        let split0 = r#"{"TimeIndex": ["2021-01-01 10:00:00"], "Columns": {"x": [1.5]}}"#;
        let ts = load_json(split0, JsonShape::Split0).unwrap();
        assert_eq!(ts.start().unwrap(), parse_time("2021-01-01 10:00:00").unwrap());

        let split1 = r#"{"timestamp": ["2021-01-01"], "columns": {"y": [2.5]}}"#;
        let ts = load_json(split1, JsonShape::Split1).unwrap();
        assert_eq!(ts.get("y"), Some(&[2.5][..]));
    }

    #[test]
    fn test_load_yahoo() {
        let text = r#"{
            "Date": ["2021-01-04", "2021-01-05"],
            "Open": [1.0, 2.0], "High": [1.5, 2.5], "Low": [0.5, 1.5],
            "Close": [1.2, 2.2], "Volume": [100.0, 200.0]
        }"#;
        let ts = load_json(text, JsonShape::Yahoo).unwrap();
        assert_eq!(ts.list_columns(), vec!["close", "high", "low", "open", "volume"]);
        assert_eq!(ts.get("close"), Some(&[1.2, 2.2][..]));
    }

    #[test]
    fn test_load_generic_without_volume() {
        let text = r#"{
            "timestamp": ["2021-01-04T00:00:00Z"],
            "open": [1.0], "high": [1.5], "low": [0.5], "close": [1.2]
        }"#;
        let ts = load_json(text, JsonShape::Generic).unwrap();
        assert_eq!(ts.get("volume"), None);
        assert_eq!(ts.get("open"), Some(&[1.0][..]));
    }

    #[test]
    fn test_wrong_shape_is_empty() {
        let text = r#"{"index": ["2021-01-01"], "columns": {"close": [1.0]}}"#;
        assert!(matches!(
            load_json(text, JsonShape::Yahoo),
            Err(LoaderError::Empty)
        ));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(matches!(
            load_json("not json", JsonShape::Split),
            Err(LoaderError::Json(_))
        ));

        let mismatched = r#"{"index": ["2021-01-01"], "columns": {"close": [1.0, 2.0]}}"#;
        assert!(matches!(
            load_json(mismatched, JsonShape::Split),
            Err(LoaderError::Series(SeriesError::LengthMismatch { .. }))
        ));

        let bad_date = r#"{"index": ["someday"], "columns": {"close": [1.0]}}"#;
        assert!(matches!(
            load_json(bad_date, JsonShape::Split),
            Err(LoaderError::Series(SeriesError::Parse { .. }))
        ));
    }
}
