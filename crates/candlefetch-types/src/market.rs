//! Exchange, symbol and resolution metadata returned by providers.

use serde::{Deserialize, Serialize};

use crate::Period;

/// A trading venue known to a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    /// Provider identifier (e.g. "BINANCE").
    pub exchange_id: String,
    /// Display name, when the provider reports one.
    #[serde(default)]
    pub name: Option<String>,
    /// Venue website.
    #[serde(default)]
    pub website: Option<String>,
    /// Trailing 24h volume in USD.
    #[serde(default)]
    pub volume_1day_usd: Option<f64>,
}

impl Exchange {
    /// Creates an exchange entry with only an identifier.
    #[must_use]
    pub fn new(exchange_id: impl Into<String>) -> Self {
        Self {
            exchange_id: exchange_id.into(),
            name: None,
            website: None,
            volume_1day_usd: None,
        }
    }
}

/// A tradable symbol on an exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    /// Provider symbol identifier (e.g. "BINANCE_SPOT_BTC_USDT").
    pub symbol_id: String,
    /// Exchange identifier.
    pub exchange_id: String,
    /// Base asset (e.g. "BTC").
    pub asset_id_base: String,
    /// Quote asset (e.g. "USDT").
    pub asset_id_quote: String,
}

impl SymbolInfo {
    /// Creates a symbol entry.
    #[must_use]
    pub fn new(symbol_id: &str, exchange_id: &str, base: &str, quote: &str) -> Self {
        Self {
            symbol_id: symbol_id.to_string(),
            exchange_id: exchange_id.to_string(),
            asset_id_base: base.to_string(),
            asset_id_quote: quote.to_string(),
        }
    }

    /// Returns true if this symbol passes the search and exchange filters.
    ///
    /// `search` matches case-insensitively against the symbol id or base
    /// asset; `exchange` must equal the exchange id (case-insensitive). Empty
    /// filters match everything.
    #[must_use]
    pub fn matches(&self, search: &str, exchange: &str) -> bool {
        let search = search.trim().to_uppercase();
        let exchange = exchange.trim().to_uppercase();

        let search_ok = search.is_empty()
            || self.symbol_id.to_uppercase().contains(&search)
            || self.asset_id_base.to_uppercase().contains(&search);
        let exchange_ok = exchange.is_empty() || self.exchange_id.to_uppercase() == exchange;

        search_ok && exchange_ok
    }
}

/// A selectable candle resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// Identifier to pass back as `period_id`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Grouping label (Seconds, Minutes, Hours, Days, Months, Other).
    pub category: String,
    /// Nominal length in seconds, 0 when unknown.
    #[serde(default)]
    pub length_seconds: u64,
}

impl Resolution {
    /// Builds a resolution for `id`, deriving name and category from its
    /// parsed period when possible.
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        match id.parse::<Period>() {
            Ok(period) => Self {
                id: id.to_string(),
                name: period.display_name(),
                category: period.category().to_string(),
                length_seconds: period.seconds(),
            },
            Err(_) => Self {
                id: id.to_string(),
                name: id.to_string(),
                category: "Other".to_string(),
                length_seconds: 0,
            },
        }
    }
}
