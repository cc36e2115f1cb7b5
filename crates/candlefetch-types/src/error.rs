//! Error types for candlefetch.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Result type alias for candlefetch type-level operations.
pub type Result<T> = std::result::Result<T, CandlefetchError>;

/// Errors raised while interpreting request parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CandlefetchError {
    /// Unrecognized period identifier.
    #[error("invalid period '{0}', expected forms like 1MIN, 4HRS, 1DAY, 5min, 1hour or daily")]
    InvalidPeriod(String),

    /// A date or timestamp bound could not be parsed.
    #[error("invalid date '{0}', expected YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS")]
    InvalidTimestamp(String),

    /// Start bound is after end bound.
    #[error("Invalid time window: {start} > {end}")]
    InvalidWindow {
        /// The start bound.
        start: NaiveDateTime,
        /// The end bound.
        end: NaiveDateTime,
    },
}
