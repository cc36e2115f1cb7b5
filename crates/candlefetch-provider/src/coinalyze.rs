//! Coinalyze REST provider (Hyperliquid markets).

use async_trait::async_trait;
use candlefetch_types::{Candle, Exchange, Resolution, SymbolInfo};
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::client::HttpClient;
use crate::{CandleProvider, CandleRequest, ProviderConfig, ProviderError};

/// Default Coinalyze endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.coinalyze.net/v1";

const AUTH_HEADER: &str = "api_key";

/// Hyperliquid exchange code.
const EXCHANGE_CODE: &str = "H";

const INTERVALS: &[&str] = &[
    "1min", "5min", "15min", "30min", "1hour", "2hour", "4hour", "6hour", "12hour", "daily",
];

const CURATED_SYMBOLS: &[(&str, &str, &str, &str)] = &[
    ("HYPE-USDC.H", EXCHANGE_CODE, "HYPE", "USDC"),
    ("PURR-USDC.H", EXCHANGE_CODE, "PURR", "USDC"),
];

/// One `history` entry.
#[derive(Debug, Deserialize)]
struct HistoryPoint {
    t: i64,
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
    #[serde(default)]
    bv: f64,
}

/// Coinalyze market-data provider.
#[derive(Debug, Clone)]
pub struct CoinalyzeProvider {
    http: HttpClient,
}

impl CoinalyzeProvider {
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

fn history_query(request: &CandleRequest) -> Result<Vec<(&'static str, String)>, ProviderError> {
    let window = request.window()?;
    let mut query = vec![("interval", request.period_id.clone())];

    if let Some(start) = window.start {
        query.push(("from", start.and_utc().timestamp().to_string()));
    }
    if let Some(end) = window.end {
        query.push(("to", end.and_utc().timestamp().to_string()));
    }
    query.push(("symbols", request.symbol.clone()));

    Ok(query)
}

/// Decodes a Coinalyze `ohlcv-history` response into candles sorted
/// oldest-first.
///
/// Only the first symbol's history is read.
///
/// # Errors
///
/// Returns [`ProviderError::Decode`] if the response or one of its points does
/// not have the expected shape.
pub fn parse_history(raw: Vec<Value>) -> Result<Vec<Candle>, ProviderError> {
    let Some(first) = raw.into_iter().next() else {
        return Ok(Vec::new());
    };
    let history = match first {
        Value::Object(mut map) => map.remove("history").unwrap_or(Value::Array(Vec::new())),
        other => {
            return Err(ProviderError::Decode(format!(
                "expected an object per symbol, got {other}"
            )));
        }
    };

    let points: Vec<HistoryPoint> = serde_json::from_value(history)?;
    let mut candles = points
        .into_iter()
        .map(|p| {
            let time = DateTime::from_timestamp(p.t, 0)
                .ok_or_else(|| ProviderError::Decode(format!("timestamp out of range: {}", p.t)))?;
            Ok(Candle::with_reported_buy_volume(
                time, p.o, p.h, p.l, p.c, p.v, p.bv,
            ))
        })
        .collect::<Result<Vec<_>, ProviderError>>()?;

    candles.sort_by_key(|c| c.time);
    Ok(candles)
}

#[async_trait]
impl CandleProvider for CoinalyzeProvider {
    fn platform_name(&self) -> &str {
        "Coinalyze"
    }

    async fn fetch_candles(&self, request: &CandleRequest) -> Result<Vec<Value>, ProviderError> {
        let query = history_query(request)?;

        let data: Vec<Value> = self.http.get_json("ohlcv-history", &query).await?;
        if data.is_empty() {
            return Err(ProviderError::NoData);
        }

        debug!(symbol = %request.symbol, "received history");
        Ok(data)
    }

    fn normalize(&self, raw: Vec<Value>) -> Result<Vec<Candle>, ProviderError> {
        parse_history(raw)
    }

    async fn list_exchanges(&self) -> Result<Vec<Exchange>, ProviderError> {
        let mut hyperliquid = Exchange::new(EXCHANGE_CODE);
        hyperliquid.name = Some("Hyperliquid".to_string());
        Ok(vec![hyperliquid])
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
        Ok(INTERVALS.iter().map(|id| Resolution::from_id(id)).collect())
    }

    fn validate_symbol(&self, symbol: &str) -> bool {
        symbol.split('.').nth(1) == Some(EXCHANGE_CODE)
    }

    fn validate_resolution(&self, period_id: &str) -> bool {
        INTERVALS.contains(&period_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    fn provider() -> CoinalyzeProvider {
        CoinalyzeProvider::new(&ProviderConfig::new("test-key")).unwrap()
    }

    #[test]
    fn test_query_uses_unix_bounds() {
        let request = CandleRequest::new("HYPE-USDC.H", "daily")
            .with_window(Some("2024-01-01".into()), Some("2024-01-01".into()));
        let query = history_query(&request).unwrap();

        assert!(query.contains(&("interval", "daily".to_string())));
        assert!(query.contains(&("from", "1704067200".to_string())));
        assert!(query.contains(&("to", "1704153599".to_string())));
        assert!(query.contains(&("symbols", "HYPE-USDC.H".to_string())));
    }

    #[test]
    fn test_parse_history() {
        let raw = vec![json!({
            "symbol": "HYPE-USDC.H",
            "history": [
                {"t": 1704153600, "o": 2.0, "h": 2.5, "l": 1.8, "c": 2.2, "v": 300.0, "bv": 200.0},
                {"t": 1704067200, "o": 1.0, "h": 2.1, "l": 0.9, "c": 2.0, "v": 100.0, "bv": 40.0}
            ]
        })];

        let candles = parse_history(raw).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time.timestamp(), 1_704_067_200);
        assert_relative_eq!(candles[0].buy_volume, 22.0);
        assert_relative_eq!(candles[0].sell_volume, 60.0);
    }

    #[test]
    fn test_parse_history_rejects_non_object() {
        assert!(matches!(
            parse_history(vec![json!([1, 2, 3])]),
            Err(ProviderError::Decode(_))
        ));
    }

    #[test]
    fn test_validators() {
        let p = provider();
        assert!(p.validate_symbol("HYPE-USDC.H"));
        assert!(!p.validate_symbol("HYPE-USDC"));
        assert!(!p.validate_symbol("BINANCE_SPOT_BTC_USDT"));
        assert!(p.validate_resolution("4hour"));
        assert!(!p.validate_resolution("4HRS"));
    }

    #[tokio::test]
    async fn test_static_metadata() {
        let p = provider();
        let exchanges = p.list_exchanges().await.unwrap();
        assert_eq!(exchanges[0].exchange_id, "H");

        let resolutions = p.list_resolutions().await.unwrap();
        assert_eq!(resolutions.len(), INTERVALS.len());
        assert_eq!(resolutions.last().unwrap().name, "1 Day");

        let purr = p.list_symbols("purr", "h").await.unwrap();
        assert_eq!(purr.len(), 1);
    }
}
