//! Time Parsing
//!
//! Converts date/time strings into [`TimeValue`]s and interval specifiers
//! ("1h", "day", "2w") into [`Duration`]s.
//!
//! # Accepted date/time shapes
//!
//! ```text
//! 2021-01-01                 date only (midnight)
//! 13:45:00                   time only (year 0, January 1)
//! 2021-01-01 13:45:00        date and time
//! 2021-01-01T13:45:00+05:30  'T' separator and zone offset are dropped
//! ```
//!
//! Intervals top out at a week: months and years are not a fixed length,
//! so they are rejected instead of guessed.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1},
    combinator::{map_res, opt, recognize, value},
    multi::many1,
    sequence::pair,
    IResult,
};
use regex::Regex;

use crate::series::error::{SeriesError, SeriesResult};

/// A single point on the time index
pub type TimeValue = NaiveDateTime;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S%.f";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parse a date, a time of day, or both
pub fn parse_time(text: &str) -> SeriesResult<TimeValue> {
    let normalized = normalize_datetime(text);
    let mut parts = normalized.split_whitespace();

    let (date, time) = match (parts.next(), parts.next()) {
        (Some(d), Some(t)) => (Some(d), Some(t)),
        (Some(single), None) if single.contains(':') => (None, Some(single)),
        (Some(single), None) => (Some(single), None),
        _ => {
            return Err(SeriesError::parse(
                text,
                "could not find time OR date in provided string",
            ))
        }
    };

    match (date, time) {
        (Some(d), Some(t)) => {
            NaiveDateTime::parse_from_str(&format!("{} {}", d, t), DATETIME_FORMAT)
                .map_err(|e| SeriesError::parse(text, e))
        }
        (Some(d), None) => {
            let date =
                NaiveDate::parse_from_str(d, DATE_FORMAT).map_err(|e| SeriesError::parse(text, e))?;
            date.and_hms_opt(0, 0, 0)
                .ok_or_else(|| SeriesError::parse(text, "invalid midnight"))
        }
        (None, Some(t)) => {
            let time =
                NaiveTime::parse_from_str(t, TIME_FORMAT).map_err(|e| SeriesError::parse(text, e))?;
            let epoch = NaiveDate::from_ymd_opt(0, 1, 1)
                .ok_or_else(|| SeriesError::parse(text, "year zero is not representable"))?;
            Ok(epoch.and_time(time))
        }
        (None, None) => Err(SeriesError::parse(
            text,
            "could not find time OR date in provided string",
        )),
    }
}

/// Parse every entry of an index, failing on the first bad one
pub fn parse_time_array<S: AsRef<str>>(texts: &[S]) -> SeriesResult<Vec<TimeValue>> {
    texts.iter().map(|t| parse_time(t.as_ref())).collect()
}

/// Drop the 'T' separator and any trailing zone designator
fn normalize_datetime(text: &str) -> String {
    let mut s = text.trim().replacen('T', " ", 1);

    if let Some(pos) = s.find('+') {
        s.truncate(pos);
    }
    if s.ends_with('Z') {
        s.pop();
    }
    // A '-' after the first ':' can only be a negative zone offset
    if let Some(colon) = s.find(':') {
        if let Some(dash) = s.rfind('-') {
            if dash > colon {
                s.truncate(dash);
            }
        }
    }

    s.trim_end().to_string()
}

/// Parse an interval specifier into a duration
///
/// With `absolute` set the text goes straight to [`parse_duration`].
/// Otherwise a leading `<number><unit>` token is read, where the unit is one
/// of `s`, `m`, `h`, `d` (24h) or `w` (168h) and a missing number means 1.
/// The bare words `second`, `minute`, `hour`, `day` and `week` are also
/// understood.
///
/// The unit is a single letter: a unit letter followed by more letters is
/// refused, so "15min" and "13months" both fail. Write "15m" instead.
///
/// # Examples
///
/// ```rust
/// use chronoframe::series::parse_interval;
/// use chrono::Duration;
///
/// assert_eq!(parse_interval("2d", false).unwrap(), Duration::hours(48));
/// assert!(parse_interval("13months", false).is_err());
/// ```
pub fn parse_interval(spec: &str, absolute: bool) -> SeriesResult<Duration> {
    if absolute {
        return parse_duration(spec);
    }

    let spec_trimmed = spec.trim();
    match spec_trimmed {
        "second" => return Ok(Duration::seconds(1)),
        "minute" => return Ok(Duration::minutes(1)),
        "hour" => return Ok(Duration::hours(1)),
        "day" => return Ok(Duration::hours(24)),
        "week" => return Ok(Duration::hours(168)),
        _ => {}
    }

    let re = Regex::new(r"^(\d*)([a-zA-Z])(?:[^a-zA-Z]|$)")
        .map_err(|e| SeriesError::InvalidInterval(e.to_string()))?;

    let caps = re.captures(spec_trimmed).ok_or_else(|| {
        SeriesError::InvalidInterval(format!(
            "parsing interval '{}' failed: expected <number><unit> or one of second, minute, hour, day, week",
            spec
        ))
    })?;

    let magnitude: i64 = match &caps[1] {
        "" => 1,
        digits => digits
            .parse()
            .map_err(|_| SeriesError::InvalidInterval(format!("magnitude too large in '{}'", spec)))?,
    };

    let unit_secs: i64 = match &caps[2] {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 24 * 3600,
        "w" => 168 * 3600,
        other => {
            return Err(SeriesError::InvalidInterval(format!(
                "unsupported unit '{}' in '{}' (max interval is a week)",
                other, spec
            )))
        }
    };

    magnitude
        .checked_mul(unit_secs)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| SeriesError::InvalidInterval(format!("interval '{}' overflows", spec)))
}

/// Parse a raw duration such as "1h30m", "1.5h", "300ms" or "-2s"
pub fn parse_duration(text: &str) -> SeriesResult<Duration> {
    let input = text.trim();
    let (negative, body) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };

    if body == "0" {
        return Ok(Duration::zero());
    }

    let components = match many1(duration_component)(body) {
        Ok(("", components)) => components,
        Ok((remaining, _)) => {
            return Err(SeriesError::parse(
                text,
                format!("unexpected input '{}'", remaining),
            ))
        }
        Err(e) => return Err(SeriesError::parse(text, format!("{:?}", e))),
    };

    let nanos: f64 = components
        .iter()
        .map(|(number, unit_nanos)| number * *unit_nanos as f64)
        .sum();

    if !nanos.is_finite() || nanos > i64::MAX as f64 {
        return Err(SeriesError::parse(text, "duration overflows"));
    }

    let duration = Duration::nanoseconds(nanos as i64);
    Ok(if negative { -duration } else { duration })
}

/// One `<decimal><unit>` component, returned as (number, nanoseconds per unit)
fn duration_component(input: &str) -> IResult<&str, (f64, i64)> {
    let (input, number) = map_res(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        |s: &str| s.parse::<f64>(),
    )(input)?;

    let (input, unit) = alt((
        value(1i64, tag("ns")),
        value(1_000i64, alt((tag("us"), tag("µs"), tag("μs")))),
        value(1_000_000i64, tag("ms")),
        value(1_000_000_000i64, tag("s")),
        value(60_000_000_000i64, tag("m")),
        value(3_600_000_000_000i64, tag("h")),
    ))(input)?;

    Ok((input, (number, unit)))
}
