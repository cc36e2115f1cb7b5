//! Normalized candle (OHLCV) row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Share of traded volume attributed to buyers when a provider does not
/// report the split.
pub(crate) const BUY_SHARE: f64 = 0.55;

/// Share of traded volume attributed to sellers when a provider does not
/// report the split.
pub(crate) const SELL_SHARE: f64 = 0.45;

/// One candle in the provider-independent layout written to CSV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Period start time.
    pub time: DateTime<Utc>,
    /// Opening price.
    pub open: f64,
    /// Highest price during the period.
    pub high: f64,
    /// Lowest price during the period.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Total traded volume.
    pub volume: f64,
    /// Volume attributed to buyers.
    pub buy_volume: f64,
    /// Volume attributed to sellers.
    pub sell_volume: f64,
}

impl Candle {
    /// Creates a candle with an explicit buy/sell split.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub const fn new(
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        buy_volume: f64,
        sell_volume: f64,
    ) -> Self {
        Self {
            time,
            open,
            high,
            low,
            close,
            volume,
            buy_volume,
            sell_volume,
        }
    }

    /// Creates a candle whose buy/sell split is estimated from total volume
    /// (55% buy, 45% sell).
    #[must_use]
    pub fn with_estimated_split(
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self::new(
            time,
            open,
            high,
            low,
            close,
            volume,
            volume * BUY_SHARE,
            volume * SELL_SHARE,
        )
    }

    /// Creates a candle from a provider-reported buy volume.
    ///
    /// The buy side is scaled by the same 55% share as the estimate, and the
    /// sell side is the remainder of total volume over the reported buy volume.
    #[must_use]
    pub fn with_reported_buy_volume(
        time: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        reported_buy: f64,
    ) -> Self {
        Self::new(
            time,
            open,
            high,
            low,
            close,
            volume,
            reported_buy * BUY_SHARE,
            volume - reported_buy,
        )
    }

    /// Returns the price range (high - low).
    #[must_use]
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Returns the body size (|close - open|).
    #[must_use]
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Returns true if this is a bullish (green) candle.
    #[must_use]
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Returns true if this is a bearish (red) candle.
    #[must_use]
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}
