//! Candle resolution identifiers.

use crate::CandlefetchError;
use std::str::FromStr;

/// Unit of a candle period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PeriodUnit {
    /// Seconds (`SEC`).
    Second,
    /// Minutes (`MIN`, `min`).
    Minute,
    /// Hours (`HRS`, `hour`).
    Hour,
    /// Days (`DAY`, `daily`).
    Day,
    /// Calendar months, approximated as 30 days (`MTH`).
    Month,
    /// Years, approximated as 365 days (`YRS`).
    Year,
}

impl PeriodUnit {
    /// Nominal length of one unit in seconds.
    #[must_use]
    pub const fn seconds(&self) -> u64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
            Self::Month => 30 * 86_400,
            Self::Year => 365 * 86_400,
        }
    }

    /// CoinAPI suffix for this unit.
    #[must_use]
    pub const fn coinapi_suffix(&self) -> &'static str {
        match self {
            Self::Second => "SEC",
            Self::Minute => "MIN",
            Self::Hour => "HRS",
            Self::Day => "DAY",
            Self::Month => "MTH",
            Self::Year => "YRS",
        }
    }

    /// Grouping label used by resolution pickers.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Second => "Seconds",
            Self::Minute => "Minutes",
            Self::Hour => "Hours",
            Self::Day => "Days",
            Self::Month | Self::Year => "Months",
        }
    }

    const fn noun(&self) -> &'static str {
        match self {
            Self::Second => "Second",
            Self::Minute => "Minute",
            Self::Hour => "Hour",
            Self::Day => "Day",
            Self::Month => "Month",
            Self::Year => "Year",
        }
    }
}

/// A candle period such as `1DAY` or `15min`.
///
/// Both CoinAPI (`5MIN`, `4HRS`, `1DAY`) and Coinalyze (`5min`, `4hour`,
/// `daily`) spellings parse into the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    count: u32,
    unit: PeriodUnit,
}

impl Period {
    /// Creates a period of `count` units.
    #[must_use]
    pub const fn new(count: u32, unit: PeriodUnit) -> Self {
        Self { count, unit }
    }

    /// Number of units in the period.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// The period's unit.
    #[must_use]
    pub const fn unit(&self) -> PeriodUnit {
        self.unit
    }

    /// Nominal period length in seconds.
    #[must_use]
    pub const fn seconds(&self) -> u64 {
        self.count as u64 * self.unit.seconds()
    }

    /// Returns the CoinAPI identifier (e.g. `1HRS`).
    #[must_use]
    pub fn coinapi_id(&self) -> String {
        format!("{}{}", self.count, self.unit.coinapi_suffix())
    }

    /// Human-readable name (e.g. `1 Hour`, `15 Minutes`).
    #[must_use]
    pub fn display_name(&self) -> String {
        let noun = self.unit.noun();
        if self.count == 1 {
            format!("1 {noun}")
        } else {
            format!("{} {noun}s", self.count)
        }
    }

    /// Grouping label used by resolution pickers.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        self.unit.category()
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.count, self.unit.coinapi_suffix())
    }
}

impl FromStr for Period {
    type Err = CandlefetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "daily" {
            return Ok(Self::new(1, PeriodUnit::Day));
        }

        let split = lower
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| CandlefetchError::InvalidPeriod(s.to_string()))?;
        let (digits, suffix) = lower.split_at(split);

        let count: u32 = digits
            .parse()
            .map_err(|_| CandlefetchError::InvalidPeriod(s.to_string()))?;
        if count == 0 {
            return Err(CandlefetchError::InvalidPeriod(s.to_string()));
        }

        let unit = match suffix {
            "sec" | "s" => PeriodUnit::Second,
            "min" | "m" => PeriodUnit::Minute,
            "hrs" | "hour" | "h" => PeriodUnit::Hour,
            "day" | "d" => PeriodUnit::Day,
            "mth" => PeriodUnit::Month,
            "yrs" => PeriodUnit::Year,
            _ => return Err(CandlefetchError::InvalidPeriod(s.to_string())),
        };

        Ok(Self::new(count, unit))
    }
}
