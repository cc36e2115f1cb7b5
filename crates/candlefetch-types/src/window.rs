//! Request time windows.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::{CandlefetchError, Period};

/// Extra candles requested on top of the estimate.
const ESTIMATE_BUFFER: i64 = 50;

/// Ceiling for estimated candle counts.
const MAX_ESTIMATED_CANDLES: u32 = 50_000;

/// Limit used when the period length is unknown.
const UNKNOWN_PERIOD_LIMIT: u32 = 10_000;

/// Optional start/end bounds for a history request, in UTC.
///
/// Bounds are accepted either as a calendar date (`YYYY-MM-DD`) or as a full
/// timestamp. A bare start date expands to the beginning of that day and a
/// bare end date to its last second, so `2024-01-01..2024-01-01` covers the
/// whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    /// Inclusive start bound.
    pub start: Option<NaiveDateTime>,
    /// Inclusive end bound.
    pub end: Option<NaiveDateTime>,
}

impl TimeWindow {
    /// Parses optional bounds, validating that start <= end.
    ///
    /// Empty strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound cannot be parsed or start > end.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, CandlefetchError> {
        let start = start.map(|s| parse_bound(s, false)).transpose()?.flatten();
        let end = end.map(|s| parse_bound(s, true)).transpose()?.flatten();

        if let (Some(start), Some(end)) = (start, end)
            && start > end
        {
            return Err(CandlefetchError::InvalidWindow { start, end });
        }

        Ok(Self { start, end })
    }

    /// Returns the window length when both bounds are present.
    #[must_use]
    pub fn duration(&self) -> Option<TimeDelta> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// Estimates how many candles of `period` fit in the window.
    ///
    /// Returns `None` unless both bounds are present. An unknown period yields
    /// a fixed fallback limit.
    #[must_use]
    pub fn estimated_candles(&self, period: Option<Period>) -> Option<u32> {
        let duration = self.duration()?;
        let Some(period) = period else {
            return Some(UNKNOWN_PERIOD_LIMIT);
        };

        let per_candle = i64::try_from(period.seconds()).unwrap_or(i64::MAX);
        let estimate = duration.num_seconds() / per_candle + ESTIMATE_BUFFER;
        Some(u32::try_from(estimate.max(0)).map_or(MAX_ESTIMATED_CANDLES, |n| {
            n.min(MAX_ESTIMATED_CANDLES)
        }))
    }
}

/// Parses a single bound; returns `Ok(None)` for blank input.
fn parse_bound(raw: &str, is_end: bool) -> Result<Option<NaiveDateTime>, CandlefetchError> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if value.len() == 10 {
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_err(|_| CandlefetchError::InvalidTimestamp(raw.to_string()))?;
        let time = if is_end {
            NaiveTime::from_hms_opt(23, 59, 59)
        } else {
            NaiveTime::from_hms_opt(0, 0, 0)
        };
        return time
            .map(|t| Some(date.and_time(t)))
            .ok_or_else(|| CandlefetchError::InvalidTimestamp(raw.to_string()));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.naive_utc()));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .map(Some)
        .map_err(|_| CandlefetchError::InvalidTimestamp(raw.to_string()))
}
