//! UTC date handling for time-windowed queries.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::{AppError, AppResult};

/// Inclusive time window. A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// Lower bound, inclusive.
    pub from: Option<DateTime<Utc>>,
    /// Upper bound, inclusive.
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    /// Build a window from already parsed bounds.
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> AppResult<Self> {
        match (from, to) {
            (Some(from), Some(to)) if from > to => Err(AppError::Validation(format!(
                "from ({}) is after to ({})",
                from.to_rfc3339(),
                to.to_rfc3339()
            ))),
            _ => Ok(Self { from, to }),
        }
    }

    /// Parse a window from query-string bounds.
    ///
    /// Each bound is either an RFC 3339 timestamp or a bare `YYYY-MM-DD`
    /// date, which means midnight UTC of that day.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> AppResult<Self> {
        let from = from.map(parse_instant).transpose()?;
        let to = to.map(parse_instant).transpose()?;
        Self::new(from, to)
    }
}

/// Parse a single bound.
pub fn parse_instant(value: &str) -> AppResult<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| AppError::Validation(format!("Invalid date: {value}")))
}

/// Number of events on one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayCount {
    /// Day formatted as `YYYY-MM-DD`.
    pub date: String,
    /// Events on that day.
    pub count: u64,
}

/// Bucket timestamps by UTC calendar day, ascending, omitting empty days.
pub fn day_series<I>(instants: I) -> Vec<DayCount>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut buckets: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for instant in instants {
        *buckets.entry(instant.date_naive()).or_default() += 1;
    }

    buckets
        .into_iter()
        .map(|(date, count)| DayCount {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}
