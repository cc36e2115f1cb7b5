//! CoinAPI REST provider.

use async_trait::async_trait;
use candlefetch_types::{Candle, Exchange, Period, Resolution, SymbolInfo};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::client::HttpClient;
use crate::{CandleProvider, CandleRequest, ProviderConfig, ProviderError};

/// Default CoinAPI endpoint.
pub const DEFAULT_BASE_URL: &str = "https://rest.coinapi.io/v1";

const AUTH_HEADER: &str = "X-CoinAPI-Key";

/// Exchanges below this trailing-day USD volume are not listed.
const MIN_EXCHANGE_VOLUME_USD: f64 = 1_000_000.0;

const MAX_EXCHANGES: usize = 20;

/// Period identifiers accepted for history requests.
const VALID_PERIODS: &[&str] = &[
    "1SEC", "2SEC", "3SEC", "4SEC", "5SEC", "6SEC", "10SEC", "15SEC", "20SEC", "30SEC", "1MIN",
    "2MIN", "3MIN", "4MIN", "5MIN", "6MIN", "10MIN", "15MIN", "20MIN", "30MIN", "1HRS", "2HRS",
    "3HRS", "4HRS", "6HRS", "8HRS", "12HRS", "1DAY", "2DAY", "3DAY", "7DAY", "1MTH",
];

/// Served when `/ohlcv/periods` is unavailable.
const FALLBACK_RESOLUTIONS: &[&str] = &["1MIN", "5MIN", "15MIN", "30MIN", "1HRS", "4HRS", "1DAY"];

/// (symbol_id, exchange_id, base, quote)
const CURATED_SYMBOLS: &[(&str, &str, &str, &str)] = &[
    ("BINANCE_SPOT_BTC_USDT", "BINANCE", "BTC", "USDT"),
    ("BINANCE_SPOT_ETH_USDT", "BINANCE", "ETH", "USDT"),
    ("BINANCE_SPOT_ADA_USDT", "BINANCE", "ADA", "USDT"),
    ("BINANCE_SPOT_DOT_USDT", "BINANCE", "DOT", "USDT"),
    ("BINANCE_SPOT_LINK_USDT", "BINANCE", "LINK", "USDT"),
    ("COINBASE_SPOT_BTC_USD", "COINBASE", "BTC", "USD"),
    ("COINBASE_SPOT_ETH_USD", "COINBASE", "ETH", "USD"),
    ("KRAKEN_SPOT_BTC_USD", "KRAKEN", "BTC", "USD"),
    ("KRAKEN_SPOT_ETH_USD", "KRAKEN", "ETH", "USD"),
];

const SYMBOL_TYPES: &[&str] = &["SPOT", "FUTURES", "OPTION"];

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One row of `/ohlcv/{symbol}/history`.
#[derive(Debug, Deserialize)]
struct HistoryRecord {
    time_period_start: DateTime<Utc>,
    price_open: f64,
    price_high: f64,
    price_low: f64,
    price_close: f64,
    volume_traded: f64,
}

/// One row of `/ohlcv/periods`.
#[derive(Debug, Deserialize)]
struct PeriodRecord {
    period_id: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    length_seconds: u64,
}

/// CoinAPI market-data provider.
#[derive(Debug, Clone)]
pub struct CoinApiProvider {
    http: HttpClient,
}

impl CoinApiProvider {
    /// Creates a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            http: HttpClient::new(config, DEFAULT_BASE_URL, AUTH_HEADER)?,
        })
    }

    /// Returns the base URL in use.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }
}

/// Builds the query string for a history request.
///
/// When both bounds are present the limit is derived from the window so a
/// single request covers it; otherwise the caller's limit, if any, is sent.
fn history_query(request: &CandleRequest) -> Result<Vec<(&'static str, String)>, ProviderError> {
    let window = request.window()?;
    let mut query = vec![("period_id", request.period_id.clone())];

    if let Some(start) = window.start {
        query.push(("time_start", format_time(start)));
    }
    if let Some(end) = window.end {
        query.push(("time_end", format_time(end)));
    }

    let period = request.period_id.parse::<Period>().ok();
    if let Some(estimated) = window.estimated_candles(period) {
        query.push(("limit", estimated.to_string()));
    } else if let Some(limit) = request.limit {
        query.push(("limit", limit.to_string()));
    }

    Ok(query)
}

/// Decodes CoinAPI history rows into candles sorted oldest-first.
///
/// # Errors
///
/// Returns [`ProviderError::Decode`] naming the first row that does not have
/// the expected shape.
pub fn parse_history(raw: Vec<Value>) -> Result<Vec<Candle>, ProviderError> {
    let mut candles = raw
        .into_iter()
        .enumerate()
        .map(|(index, value)| {
            let record: HistoryRecord = serde_json::from_value(value)
                .map_err(|e| ProviderError::Decode(format!("row {index}: {e}")))?;
            Ok(Candle::with_estimated_split(
                record.time_period_start,
                record.price_open,
                record.price_high,
                record.price_low,
                record.price_close,
                record.volume_traded,
            ))
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    candles.sort_by_key(|c| c.time);
    Ok(candles)
}

/// Maps a CoinAPI period id onto a picker category.
fn categorize(period_id: &str) -> &'static str {
    if period_id.contains("SEC") {
        "Seconds"
    } else if period_id.contains("MIN") {
        "Minutes"
    } else if period_id.contains("HRS") {
        "Hours"
    } else if period_id.contains("DAY") || period_id.contains("WK") {
        "Days"
    } else if period_id.contains("MTH") || period_id.contains("YR") {
        "Months"
    } else {
        "Other"
    }
}

fn format_time(time: NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

fn fallback_resolutions() -> Vec<Resolution> {
    FALLBACK_RESOLUTIONS
        .iter()
        .map(|id| Resolution::from_id(id))
        .collect()
}

#[async_trait]
impl CandleProvider for CoinApiProvider {
    fn platform_name(&self) -> &str {
        "CoinAPI"
    }

    async fn fetch_candles(&self, request: &CandleRequest) -> Result<Vec<Value>, ProviderError> {
        let query = history_query(request)?;
        let path = format!("ohlcv/{}/history", request.symbol);

        let data: Vec<Value> = self.http.get_json(&path, &query).await?;
        if data.is_empty() {
            return Err(ProviderError::NoData);
        }

        debug!(symbol = %request.symbol, rows = data.len(), "received history");
        Ok(data)
    }

    fn normalize(&self, raw: Vec<Value>) -> Result<Vec<Candle>, ProviderError> {
        parse_history(raw)
    }

    async fn list_exchanges(&self) -> Result<Vec<Exchange>, ProviderError> {
        let exchanges: Vec<Exchange> = self.http.get_json("exchanges", &[]).await?;

        Ok(exchanges
            .into_iter()
            .filter(|ex| ex.volume_1day_usd.unwrap_or(0.0) > MIN_EXCHANGE_VOLUME_USD)
            .take(MAX_EXCHANGES)
            .collect())
    }

    async fn list_symbols(
        &self,
        search: &str,
        exchange: &str,
    ) -> Result<Vec<SymbolInfo>, ProviderError> {
        Ok(CURATED_SYMBOLS
            .iter()
            .map(|(id, ex, base, quote)| SymbolInfo::new(id, ex, base, quote))
            .filter(|symbol| symbol.matches(search, exchange))
            .collect())
    }

    async fn list_resolutions(&self) -> Result<Vec<Resolution>, ProviderError> {
        let periods: Vec<PeriodRecord> = match self.http.get_json("ohlcv/periods", &[]).await {
            Ok(periods) => periods,
            Err(ProviderError::Api { status, .. }) => {
                warn!(status, "period listing unavailable, using built-in resolutions");
                return Ok(fallback_resolutions());
            }
            Err(e) => return Err(e),
        };

        let mut resolutions: Vec<Resolution> = periods
            .into_iter()
            .map(|p| Resolution {
                category: categorize(&p.period_id).to_string(),
                name: p.display_name.unwrap_or_else(|| p.period_id.clone()),
                id: p.period_id,
                length_seconds: p.length_seconds,
            })
            .collect();
        resolutions.sort_by_key(|r| r.length_seconds);

        Ok(resolutions)
    }

    fn validate_symbol(&self, symbol: &str) -> bool {
        let parts: Vec<&str> = symbol.split('_').collect();
        parts.len() >= 4 && SYMBOL_TYPES.contains(&parts[1])
    }

    fn validate_resolution(&self, period_id: &str) -> bool {
        VALID_PERIODS.contains(&period_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn provider() -> CoinApiProvider {
        CoinApiProvider::new(&ProviderConfig::new("test-key")).unwrap()
    }

    fn query_value<'a>(query: &'a [(&str, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(provider().base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_query_derives_limit_from_window() {
        let request = CandleRequest::new("BINANCE_SPOT_BTC_USDT", "1DAY")
            .with_window(Some("2024-01-01".into()), Some("2024-01-14".into()))
            .with_limit(Some(5));
        let query = history_query(&request).unwrap();

        assert_eq!(query_value(&query, "time_start"), Some("2024-01-01T00:00:00"));
        assert_eq!(query_value(&query, "time_end"), Some("2024-01-14T23:59:59"));
        assert_eq!(query_value(&query, "limit"), Some("63"));
    }

    #[test]
    fn test_query_uses_caller_limit_without_full_window() {
        let request = CandleRequest::new("BINANCE_SPOT_BTC_USDT", "1HRS")
            .with_window(Some("2024-01-01".into()), None)
            .with_limit(Some(5));
        let query = history_query(&request).unwrap();

        assert_eq!(query_value(&query, "limit"), Some("5"));
        assert_eq!(query_value(&query, "time_end"), None);
    }

    #[test]
    fn test_query_rejects_inverted_window() {
        let request = CandleRequest::new("BINANCE_SPOT_BTC_USDT", "1DAY")
            .with_window(Some("2024-02-01".into()), Some("2024-01-01".into()));
        assert!(matches!(
            history_query(&request),
            Err(ProviderError::Request(_))
        ));
    }

    #[test]
    fn test_parse_history_sorts_and_splits_volume() {
        let raw = vec![
            json!({
                "time_period_start": "2024-01-02T00:00:00.0000000Z",
                "time_period_end": "2024-01-03T00:00:00.0000000Z",
                "price_open": 2.0, "price_high": 3.0, "price_low": 1.5,
                "price_close": 2.5, "volume_traded": 100.0, "trades_count": 7
            }),
            json!({
                "time_period_start": "2024-01-01T00:00:00.0000000Z",
                "price_open": 1.0, "price_high": 2.0, "price_low": 0.5,
                "price_close": 2.0, "volume_traded": 10.0
            }),
        ];

        let candles = parse_history(raw).unwrap();
        assert_eq!(candles.len(), 2);
        assert!(candles[0].time < candles[1].time);
        assert_relative_eq!(candles[1].buy_volume, 55.0);
        assert_relative_eq!(candles[1].sell_volume, 45.0);
    }

    #[test]
    fn test_parse_history_rejects_bad_row() {
        let raw = vec![json!({"time_period_start": "2024-01-01T00:00:00Z"})];
        match parse_history(raw) {
            Err(ProviderError::Decode(msg)) => assert!(msg.starts_with("row 0")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_symbol() {
        let p = provider();
        assert!(p.validate_symbol("BINANCE_SPOT_BTC_USDT"));
        assert!(p.validate_symbol("DERIBIT_FUTURES_BTC_USD_240329"));
        assert!(!p.validate_symbol("BTC_USDT"));
        assert!(!p.validate_symbol("BINANCE_PERP_BTC_USDT"));
    }

    #[test]
    fn test_validate_resolution() {
        let p = provider();
        assert!(p.validate_resolution("1DAY"));
        assert!(p.validate_resolution("15MIN"));
        assert!(!p.validate_resolution("15min"));
        assert!(!p.validate_resolution("1YRS"));
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("10SEC"), "Seconds");
        assert_eq!(categorize("1WKS"), "Days");
        assert_eq!(categorize("1YRS"), "Months");
        assert_eq!(categorize("TICK"), "Other");
    }

    #[tokio::test]
    async fn test_curated_symbols_filtered() {
        let p = provider();
        let all = p.list_symbols("", "").await.unwrap();
        assert_eq!(all.len(), CURATED_SYMBOLS.len());

        let eth_kraken = p.list_symbols("eth", "kraken").await.unwrap();
        assert_eq!(eth_kraken.len(), 1);
        assert_eq!(eth_kraken[0].symbol_id, "KRAKEN_SPOT_ETH_USD");
    }
}
