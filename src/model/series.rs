//! Resolution of the sales graph into a plottable time series.
//!
//! The analytics endpoint returns `order_sale_graph` as a list of `{date, total}` entries where
//! `date` may be a calendar date, an epoch number in seconds or milliseconds, a digit string, any
//! other date/time spelling, or garbage. `normalize_series` maps every entry to exactly one
//! `NormalizedSeriesPoint` with an integer millisecond timestamp and returns them sorted by that
//! timestamp. It never fails: entries whose date cannot be resolved get a synthesized timestamp
//! that keeps them in their original relative order.

use crate::clock::{Clock, DAY_MS};
use crate::model::coerce;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Positive epoch values below this are taken to be seconds rather than milliseconds.
const SECONDS_THRESHOLD: f64 = 1e11;

/// Date-time spellings without an offset. These are interpreted as UTC.
const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Minute-precision spellings with a numeric offset.
const OFFSET_MINUTE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%d %H:%M%z",
];

/// Date-only spellings. These resolve to UTC midnight.
const DATE_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

/// The `date` of a raw graph entry, as it arrived.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawDate {
    /// The field was absent or `null`.
    #[default]
    Missing,
    /// A JSON number, presumably an epoch timestamp.
    Number(f64),
    /// A JSON string in any format.
    Text(String),
    /// Booleans, lists and objects. These never resolve.
    Other(Value),
}

impl From<&Value> for RawDate {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => RawDate::Missing,
            Value::Number(n) => match n.as_f64() {
                Some(f) => RawDate::Number(f),
                None => RawDate::Other(value.clone()),
            },
            Value::String(s) => RawDate::Text(s.clone()),
            other => RawDate::Other(other.clone()),
        }
    }
}

impl Serialize for RawDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            RawDate::Missing => serializer.serialize_none(),
            RawDate::Number(n) => serializer.serialize_f64(*n),
            RawDate::Text(s) => serializer.serialize_str(s),
            RawDate::Other(v) => v.serialize(serializer),
        }
    }
}

/// One `{date, total}` entry of `order_sale_graph`.
///
/// Deserialization never fails for well-formed JSON: an entry that is not an object has a missing
/// date and a zero total.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawSeriesPoint {
    pub date: RawDate,
    pub total: f64,
}

impl RawSeriesPoint {
    pub fn new(date: RawDate, total: f64) -> Self {
        Self { date, total }
    }

    /// Reads an entry from any JSON value.
    pub fn from_value(value: &Value) -> Self {
        match value.as_object() {
            Some(entry) => Self {
                date: entry.get("date").map(RawDate::from).unwrap_or_default(),
                total: coerce::number_opt(entry.get("total")),
            },
            None => Self::default(),
        }
    }

    /// Reads a whole graph. Anything other than a list is an empty graph.
    pub fn list_from_value(value: Option<&Value>) -> Vec<Self> {
        match value {
            Some(Value::Array(entries)) => entries.iter().map(Self::from_value).collect(),
            _ => Vec::new(),
        }
    }
}

impl<'de> Deserialize<'de> for RawSeriesPoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

/// A graph entry with a resolved timestamp, ready for a numeric time axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSeriesPoint {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Short axis label such as `Aug 29`.
    pub label: String,
    pub total: f64,
}

/// Resolves every raw point to a timestamp and returns the points sorted by timestamp.
///
/// A point whose date cannot be resolved is placed one day after the previously assigned
/// timestamp. When nothing has been assigned yet, it is anchored to `clock` so that the point at
/// `index` lands `len - index - 1` days before now. The sort is stable, so points sharing a
/// timestamp keep their input order.
pub fn normalize_series<C>(points: &[RawSeriesPoint], clock: &C) -> Vec<NormalizedSeriesPoint>
where
    C: Clock + ?Sized,
{
    let len = points.len();
    let mut previous: Option<i64> = None;
    let mut series = Vec::with_capacity(len);

    for (ix, point) in points.iter().enumerate() {
        let timestamp = match resolve(&point.date) {
            Some(ts) => ts,
            None => match previous {
                Some(prev) => prev.saturating_add(DAY_MS),
                None => {
                    let days_back = i64::try_from(len - ix - 1).unwrap_or(i64::MAX);
                    clock
                        .now_millis()
                        .saturating_sub(days_back.saturating_mul(DAY_MS))
                }
            },
        };
        previous = Some(timestamp);
        series.push(NormalizedSeriesPoint {
            timestamp,
            label: label(timestamp),
            total: point.total,
        });
    }

    series.sort_by_key(|p| p.timestamp);
    series
}

/// Resolves a raw date to milliseconds since the epoch, or `None` if it cannot be resolved.
pub fn resolve(date: &RawDate) -> Option<i64> {
    match date {
        RawDate::Missing | RawDate::Other(_) => None,
        RawDate::Number(n) => from_epoch_number(*n),
        RawDate::Text(s) => resolve_text(s),
    }
}

/// Renders a timestamp as a short month-and-day label in UTC. Timestamps that `chrono` cannot
/// represent are rendered as the raw number.
pub fn label(timestamp: i64) -> String {
    match DateTime::from_timestamp_millis(timestamp) {
        Some(dt) => dt.format("%b %-d").to_string(),
        None => timestamp.to_string(),
    }
}

fn from_epoch_number(n: f64) -> Option<i64> {
    if !n.is_finite() {
        return None;
    }
    let millis = if n > 0.0 && n < SECONDS_THRESHOLD {
        n * 1000.0
    } else {
        n
    };
    // float to int casts saturate
    Some(millis.round() as i64)
}

fn resolve_text(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if is_calendar_date(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(midnight_millis);
    }
    if is_epoch_digits(s) {
        return s.parse::<f64>().ok().and_then(from_epoch_number);
    }
    parse_generic(s)
}

/// Exactly `YYYY-MM-DD`.
fn is_calendar_date(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b.iter().enumerate().all(|(ix, c)| match ix {
            4 | 7 => *c == b'-',
            _ => c.is_ascii_digit(),
        })
}

/// Ten to thirteen ASCII digits.
fn is_epoch_digits(s: &str) -> bool {
    (10..=13).contains(&s.len()) && s.bytes().all(|c| c.is_ascii_digit())
}

fn parse_generic(s: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    if let Some(dt) = OFFSET_MINUTE_FORMATS
        .iter()
        .find_map(|f| DateTime::parse_from_str(s, f).ok())
    {
        return Some(dt.timestamp_millis());
    }
    // A trailing `Z` on a spelling rfc3339 rejects, e.g. `2024-01-02T12:00Z`.
    let naive = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')).unwrap_or(s);
    if let Some(dt) = DATE_TIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(naive, f).ok())
    {
        return Some(dt.and_utc().timestamp_millis());
    }
    if let Some(millis) = parse_year_month(s) {
        return Some(millis);
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .and_then(midnight_millis)
}

/// `YYYY` or `YYYY-MM`, resolved to the first day of the period at UTC midnight. Monthly and
/// yearly graphs label their buckets this way.
fn parse_year_month(s: &str) -> Option<i64> {
    let (year, month) = match s.split_once('-') {
        Some((y, m)) => (y, Some(m)),
        None => (s, None),
    };
    let all_digits = |part: &str, len: usize| {
        part.len() == len && part.bytes().all(|c| c.is_ascii_digit())
    };
    if !all_digits(year, 4) {
        return None;
    }
    let month = match month {
        Some(m) if all_digits(m, 2) => m.parse().ok()?,
        Some(_) => return None,
        None => 1,
    };
    NaiveDate::from_ymd_opt(year.parse().ok()?, month, 1).and_then(midnight_millis)
}

fn midnight_millis(date: NaiveDate) -> Option<i64> {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
}
