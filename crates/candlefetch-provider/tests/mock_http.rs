//! Provider clients against a local mock of the upstream REST APIs.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use candlefetch_provider::{
    CandleProvider, CandleRequest, CoinApiProvider, CoinalyzeProvider, ProviderConfig,
    ProviderError,
};
use serde_json::json;

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn coinapi_history(
    Path(symbol): Path<String>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if headers.get("X-CoinAPI-Key").and_then(|v| v.to_str().ok()) != Some("good-key") {
        return (StatusCode::UNAUTHORIZED, "Invalid API key").into_response();
    }
    if symbol != "BINANCE_SPOT_BTC_USDT" {
        return Json(json!([])).into_response();
    }

    let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(3);
    let rows: Vec<_> = (1..=limit.min(3))
        .rev()
        .map(|day| {
            json!({
                "time_period_start": format!("2024-01-0{day}T00:00:00.0000000Z"),
                "price_open": 100.0, "price_high": 110.0, "price_low": 90.0,
                "price_close": 105.0, "volume_traded": 10.0
            })
        })
        .collect();
    Json(rows).into_response()
}

fn coinapi_app() -> Router {
    Router::new()
        .route("/ohlcv/:symbol/history", get(coinapi_history))
        .route(
            "/exchanges",
            get(|| async {
                Json(json!([
                    {"exchange_id": "BINANCE", "name": "Binance", "volume_1day_usd": 5.0e9},
                    {"exchange_id": "TINY", "volume_1day_usd": 10.0},
                    {"exchange_id": "NOVOLUME"}
                ]))
            }),
        )
        .route(
            "/ohlcv/periods",
            get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "maintenance") }),
        )
}

fn coinapi(base: String, key: &str) -> CoinApiProvider {
    CoinApiProvider::new(&ProviderConfig::new(key).with_base_url(Some(base))).unwrap()
}

#[tokio::test]
async fn test_coinapi_fetch_and_normalize() {
    let provider = coinapi(spawn(coinapi_app()).await, "good-key");
    let request = CandleRequest::new("BINANCE_SPOT_BTC_USDT", "1DAY");

    let raw = provider.fetch_candles(&request).await.unwrap();
    assert_eq!(raw.len(), 3);

    let candles = provider.normalize(raw).unwrap();
    assert!(candles.windows(2).all(|w| w[0].time < w[1].time));
}

#[tokio::test]
async fn test_coinapi_error_status_carries_body() {
    let provider = coinapi(spawn(coinapi_app()).await, "bad-key");
    let request = CandleRequest::new("BINANCE_SPOT_BTC_USDT", "1DAY");

    let err = provider.fetch_candles(&request).await.unwrap_err();
    assert!(matches!(err, ProviderError::Api { status: 401, .. }));
    assert_eq!(err.to_string(), "API Error: 401 - Invalid API key");
}

#[tokio::test]
async fn test_coinapi_empty_history_is_no_data() {
    let provider = coinapi(spawn(coinapi_app()).await, "good-key");
    let request = CandleRequest::new("KRAKEN_SPOT_XYZ_USD", "1DAY");

    let err = provider.fetch_candles(&request).await.unwrap_err();
    assert!(matches!(err, ProviderError::NoData));
}

#[tokio::test]
async fn test_coinapi_exchanges_filtered_by_volume() {
    let provider = coinapi(spawn(coinapi_app()).await, "good-key");
    let exchanges = provider.list_exchanges().await.unwrap();

    assert_eq!(exchanges.len(), 1);
    assert_eq!(exchanges[0].exchange_id, "BINANCE");
}

#[tokio::test]
async fn test_coinapi_resolutions_fall_back() {
    let provider = coinapi(spawn(coinapi_app()).await, "good-key");
    let resolutions = provider.list_resolutions().await.unwrap();

    let ids: Vec<_> = resolutions.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["1MIN", "5MIN", "15MIN", "30MIN", "1HRS", "4HRS", "1DAY"]);
}

#[tokio::test]
async fn test_coinapi_resolutions_from_upstream_sorted() {
    let app = Router::new().route(
        "/ohlcv/periods",
        get(|| async {
            Json(json!([
                {"period_id": "1DAY", "display_name": "1 Day", "length_seconds": 86400},
                {"period_id": "1SEC", "display_name": "1 Second", "length_seconds": 1},
                {"period_id": "1HRS", "display_name": "1 Hour", "length_seconds": 3600}
            ]))
        }),
    );
    let provider = coinapi(spawn(app).await, "good-key");
    let resolutions = provider.list_resolutions().await.unwrap();

    let ids: Vec<_> = resolutions.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, ["1SEC", "1HRS", "1DAY"]);
    assert_eq!(resolutions[0].category, "Seconds");
}

#[tokio::test]
async fn test_coinalyze_fetch_and_normalize() {
    let app = Router::new().route(
        "/ohlcv-history",
        get(
            |headers: HeaderMap, Query(query): Query<HashMap<String, String>>| async move {
                assert_eq!(headers.get("api_key").unwrap(), "c-key");
                assert_eq!(query.get("interval").map(String::as_str), Some("daily"));
                assert_eq!(query.get("from").map(String::as_str), Some("1704067200"));
                Json(json!([{
                    "symbol": "HYPE-USDC.H",
                    "history": [
                        {"t": 1704067200, "o": 1.0, "h": 2.0, "l": 0.5, "c": 1.5, "v": 10.0, "bv": 6.0}
                    ]
                }]))
            },
        ),
    );
    let base = spawn(app).await;
    let provider =
        CoinalyzeProvider::new(&ProviderConfig::new("c-key").with_base_url(Some(base))).unwrap();

    let request = CandleRequest::new("HYPE-USDC.H", "daily")
        .with_window(Some("2024-01-01".into()), Some("2024-01-02".into()));
    let raw = provider.fetch_candles(&request).await.unwrap();
    let candles = provider.normalize(raw).unwrap();

    assert_eq!(candles.len(), 1);
    assert!((candles[0].sell_volume - 4.0).abs() < f64::EPSILON);
}
