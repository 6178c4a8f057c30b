//! Chronoframe CLI
//!
//! Command-line interface over the series engine:
//! - Summarize a data file
//! - Validate it
//! - Resample it
//! - Split it into windows

use anyhow::{bail, Context};
use chronoframe::config::{Config, LoggingConfig};
use chronoframe::loader::{load_json, CsvLoader, JsonShape};
use chronoframe::series::{Criteria, TimeSeries};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "chronoframe")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Columnar time-series toolkit")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search the standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON input shape (split, split0, split1, yahoo, generic)
    #[arg(short, long, global = true)]
    pub schema: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print rows, columns and time range
    Summary {
        /// Path to a .csv or .json file
        path: PathBuf,
    },

    /// Check column lengths and, with --strict, data quality
    Validate {
        path: PathBuf,
        /// Also report unsorted or duplicate timestamps and zero rows/columns
        #[arg(long)]
        strict: bool,
    },

    /// Downsample to a coarser interval
    Resample {
        path: PathBuf,
        /// Target interval (e.g. 1h, 15m, day)
        #[arg(short, long)]
        interval: String,
        /// Aggregation per column in column=function format
        #[arg(short, long)]
        agg: Vec<String>,
    },

    /// Split into consecutive windows
    Split {
        path: PathBuf,
        /// Window length (e.g. 1h, day)
        #[arg(short, long, conflicts_with_all = ["by_day", "batch_size"])]
        interval: Option<String>,
        /// One window per calendar date
        #[arg(long, conflicts_with = "batch_size")]
        by_day: bool,
        /// Fixed number of rows per window
        #[arg(long)]
        batch_size: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(schema) = &cli.schema {
        config.engine.json_schema = schema.clone();
    }

    init_logging(&config.logging)?;

    match cli.command {
        Commands::Summary { path } => {
            let ts = load_series(&path, &config)?;
            print_summary(&ts);
        }

        Commands::Validate { path, strict } => {
            let ts = load_series(&path, &config)?;
            let warnings = ts.validate(strict || config.engine.check_non_critical)?;
            if warnings.is_empty() {
                println!("OK: {} rows, {} columns", ts.len(), ts.columns().len());
            } else {
                println!("{} warning(s):", warnings.len());
                for warning in &warnings {
                    println!("  {}", warning);
                }
            }
        }

        Commands::Resample {
            path,
            interval,
            agg,
        } => {
            let ts = load_series(&path, &config)?;
            let criteria = if agg.is_empty() {
                config.engine.criteria.clone()
            } else {
                parse_criteria(&agg)?
            };

            let resampled = ts
                .resample(&interval, Some(&criteria))
                .with_context(|| format!("Failed to resample {:?} to {}", path, interval))?;
            println!("{}", serde_json::to_string_pretty(&resampled.to_data_points())?);
        }

        Commands::Split {
            path,
            interval,
            by_day,
            batch_size,
        } => {
            let ts = load_series(&path, &config)?;
            let windows = match (interval, by_day, batch_size) {
                (Some(interval), _, _) => ts.split(&interval)?,
                (None, true, _) => ts.split_by_day(),
                (None, false, Some(n)) => ts.split_by_batch_size(n)?,
                (None, false, None) => bail!("Specify one of --interval, --by-day or --batch-size"),
            };

            tracing::info!(windows = windows.len(), "split series");
            let points: Vec<_> = windows.iter().map(TimeSeries::to_data_points).collect();
            println!("{}", serde_json::to_string_pretty(&points)?);
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("chronoframe={}", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);

    match (&logging.file, logging.format.as_str()) {
        (Some(file), format) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .with_context(|| format!("Failed to open log file {}", file))?;
            let writer = std::sync::Mutex::new(file);
            if format == "json" {
                registry
                    .with(tracing_subscriber::fmt::layer().json().with_writer(writer))
                    .init();
            } else {
                registry
                    .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                    .init();
            }
        }
        (None, "json") => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        (None, _) => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }

    Ok(())
}

/// Load a series from a .csv or .json file
fn load_series(path: &Path, config: &Config) -> anyhow::Result<TimeSeries> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {:?}", path))?;

    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let ts = if is_csv {
        CsvLoader::new().load_str(&text)
    } else {
        let shape: JsonShape = config.engine.json_shape()?;
        load_json(&text, shape)
    }
    .with_context(|| format!("Failed to load {:?}", path))?;

    tracing::info!(rows = ts.len(), columns = ts.columns().len(), "loaded {:?}", path);
    Ok(ts.set_max_size(config.engine.max_size))
}

/// Parse `column=function` pairs
fn parse_criteria(pairs: &[String]) -> anyhow::Result<Criteria> {
    pairs
        .iter()
        .map(|pair| match pair.split_once('=') {
            Some((column, function)) if !column.is_empty() && !function.is_empty() => {
                Ok((column.trim().to_string(), function.trim().to_string()))
            }
            _ => bail!("Invalid aggregation '{}', expected column=function", pair),
        })
        .collect()
}

fn print_summary(ts: &TimeSeries) {
    println!("Rows:    {}", ts.len());
    match (ts.start(), ts.end()) {
        (Ok(start), Ok(end)) => {
            println!("Start:   {}", start);
            println!("End:     {}", end);
        }
        _ => println!("Range:   (empty)"),
    }
    if let Ok(interval) = ts.interval() {
        println!("Step:    {}", interval);
    }

    println!();
    println!("{:<20} {:>14} {:>14} {:>14}", "Column", "Min", "Max", "Last");
    println!("{}", "-".repeat(65));
    for (name, values) in ts.columns() {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let last = values.last().copied().unwrap_or(f64::NAN);
        println!("{:<20} {:>14.4} {:>14.4} {:>14.4}", name, min, max, last);
    }
}
