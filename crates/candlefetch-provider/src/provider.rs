//! Provider capability trait.

use async_trait::async_trait;
use candlefetch_types::{Candle, CandlefetchError, Exchange, Resolution, SymbolInfo, TimeWindow};
use serde_json::Value;

use crate::ProviderError;

/// Parameters for one candle-history fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleRequest {
    /// Provider symbol identifier.
    pub symbol: String,
    /// Provider period identifier.
    pub period_id: String,
    /// Optional start date or timestamp.
    pub start_date: Option<String>,
    /// Optional end date or timestamp.
    pub end_date: Option<String>,
    /// Optional maximum number of candles.
    pub limit: Option<u32>,
}

impl CandleRequest {
    /// Creates a request without window or limit.
    #[must_use]
    pub fn new(symbol: impl Into<String>, period_id: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            period_id: period_id.into(),
            start_date: None,
            end_date: None,
            limit: None,
        }
    }

    /// Sets the start and end bounds.
    #[must_use]
    pub fn with_window(mut self, start_date: Option<String>, end_date: Option<String>) -> Self {
        self.start_date = start_date;
        self.end_date = end_date;
        self
    }

    /// Sets the candle limit.
    #[must_use]
    pub const fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Parses the request's bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if a bound is malformed or start > end.
    pub fn window(&self) -> Result<TimeWindow, CandlefetchError> {
        TimeWindow::parse(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

/// A market-data provider.
///
/// Fetching and normalizing are separate steps so that callers can report
/// progress between receiving data and transforming it.
#[async_trait]
pub trait CandleProvider: Send + Sync + std::fmt::Debug {
    /// Human-readable platform name (e.g. "CoinAPI").
    fn platform_name(&self) -> &str;

    /// Fetches raw candle records.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or an
    /// empty response.
    async fn fetch_candles(&self, request: &CandleRequest) -> Result<Vec<Value>, ProviderError>;

    /// Converts raw records into candles sorted oldest-first.
    ///
    /// # Errors
    ///
    /// Returns an error if a record does not have the expected shape.
    fn normalize(&self, raw: Vec<Value>) -> Result<Vec<Candle>, ProviderError>;

    /// Lists exchanges offered by the provider.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be queried.
    async fn list_exchanges(&self) -> Result<Vec<Exchange>, ProviderError>;

    /// Lists symbols matching the search and exchange filters.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be queried.
    async fn list_symbols(
        &self,
        search: &str,
        exchange: &str,
    ) -> Result<Vec<SymbolInfo>, ProviderError>;

    /// Lists available candle resolutions.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot be queried.
    async fn list_resolutions(&self) -> Result<Vec<Resolution>, ProviderError>;

    /// Returns true if `symbol` has this provider's symbol shape.
    fn validate_symbol(&self, symbol: &str) -> bool;

    /// Returns true if `period_id` is a resolution this provider accepts.
    fn validate_resolution(&self, period_id: &str) -> bool;
}
