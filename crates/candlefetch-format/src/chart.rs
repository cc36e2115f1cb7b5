//! Plotly figure construction for candle series.

use candlefetch_types::Candle;
use serde::Serialize;
use serde_json::{Value, json};

/// Only the most recent candles are plotted.
pub const MAX_CHART_CANDLES: usize = 500;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const PRICE_SHARE: f64 = 0.7;
const VERTICAL_SPACING: f64 = 0.1;
const CHART_HEIGHT: u32 = 700;
const VOLUME_COLOR: &str = "rgba(0, 150, 255, 0.6)";
const BACKGROUND_COLOR: &str = "white";

/// Request parameters shown alongside a chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartMeta {
    /// Symbol identifier.
    pub symbol: String,
    /// Period identifier.
    pub period_id: String,
    /// Requested candle limit, if any.
    pub limit: Option<u32>,
}

/// Summary of the charted job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    /// Symbol identifier.
    pub symbol: String,
    /// Period identifier.
    pub period_id: String,
    /// Requested candle limit, if any.
    pub limit: Option<u32>,
    /// Number of candles plotted.
    pub records: usize,
}

/// A Plotly figure plus the job summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    /// Plotly figure (`data` + `layout`).
    pub plot_data: Value,
    /// Summary of the charted job.
    pub job_info: JobInfo,
}

/// Builds a candlestick-over-volume figure from the tail of `candles`.
#[must_use]
pub fn build_chart(meta: &ChartMeta, candles: &[Candle]) -> ChartPayload {
    let tail = &candles[candles.len().saturating_sub(MAX_CHART_CANDLES)..];

    let times: Vec<String> = tail
        .iter()
        .map(|c| c.time.format(TIME_FORMAT).to_string())
        .collect();
    let column = |f: fn(&Candle) -> f64| tail.iter().map(f).collect::<Vec<f64>>();

    let candlestick = json!({
        "type": "candlestick",
        "name": "OHLC",
        "showlegend": false,
        "x": &times,
        "open": column(|c| c.open),
        "high": column(|c| c.high),
        "low": column(|c| c.low),
        "close": column(|c| c.close),
        "xaxis": "x",
        "yaxis": "y",
    });
    let volume = json!({
        "type": "bar",
        "name": "Volume",
        "showlegend": false,
        "x": &times,
        "y": column(|c| c.volume),
        "marker": { "color": VOLUME_COLOR },
        "xaxis": "x2",
        "yaxis": "y2",
    });

    // Two rows sharing x, split 70/30 after the gap.
    let usable = 1.0 - VERTICAL_SPACING;
    let volume_top = usable * (1.0 - PRICE_SHARE);
    let price_bottom = volume_top + VERTICAL_SPACING;

    let panel_title = format!("{} - {}", meta.symbol, meta.period_id);
    let layout = json!({
        "title": { "text": format!("{panel_title} Candlestick Chart with Volume") },
        "paper_bgcolor": BACKGROUND_COLOR,
        "plot_bgcolor": BACKGROUND_COLOR,
        "height": CHART_HEIGHT,
        "hovermode": "x unified",
        "xaxis": {
            "anchor": "y",
            "domain": [0.0, 1.0],
            "matches": "x2",
            "showticklabels": false,
            "rangeslider": { "visible": false },
        },
        "xaxis2": {
            "anchor": "y2",
            "domain": [0.0, 1.0],
            "title": { "text": "Time" },
        },
        "yaxis": {
            "anchor": "x",
            "domain": [price_bottom, 1.0],
            "title": { "text": "Price" },
        },
        "yaxis2": {
            "anchor": "x2",
            "domain": [0.0, volume_top],
            "title": { "text": "Volume" },
        },
        "annotations": [
            subplot_title(&panel_title, 1.0),
            subplot_title("Volume", volume_top),
        ],
    });

    ChartPayload {
        plot_data: json!({ "data": [candlestick, volume], "layout": layout }),
        job_info: JobInfo {
            symbol: meta.symbol.clone(),
            period_id: meta.period_id.clone(),
            limit: meta.limit,
            records: tail.len(),
        },
    }
}

fn subplot_title(text: &str, y: f64) -> Value {
    json!({
        "text": text,
        "x": 0.5,
        "xanchor": "center",
        "xref": "paper",
        "y": y,
        "yanchor": "bottom",
        "yref": "paper",
        "showarrow": false,
        "font": { "size": 16 },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn meta() -> ChartMeta {
        ChartMeta {
            symbol: "BINANCE_SPOT_BTC_USDT".into(),
            period_id: "1HRS".into(),
            limit: Some(1000),
        }
    }

    fn series(n: usize) -> Vec<Candle> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let time = start + TimeDelta::hours(i64::try_from(i).unwrap());
                let price = 100.0 + i as f64;
                Candle::with_estimated_split(time, price, price + 1.0, price - 1.0, price + 0.5, 3.0)
            })
            .collect()
    }

    #[test]
    fn test_tail_is_capped() {
        let payload = build_chart(&meta(), &series(620));
        assert_eq!(payload.job_info.records, MAX_CHART_CANDLES);

        let x = payload.plot_data["data"][0]["x"].as_array().unwrap();
        assert_eq!(x.len(), MAX_CHART_CANDLES);
        // First plotted candle is #120.
        assert_eq!(x[0], "2024-01-06 00:00:00");
    }

    #[test]
    fn test_short_series_kept_whole() {
        let payload = build_chart(&meta(), &series(14));
        assert_eq!(payload.job_info.records, 14);
        assert_eq!(payload.job_info.limit, Some(1000));
        assert_eq!(payload.plot_data["data"][1]["type"], "bar");
    }

    #[test]
    fn test_layout() {
        let payload = build_chart(&meta(), &series(3));
        let layout = &payload.plot_data["layout"];

        assert_eq!(
            layout["title"]["text"],
            "BINANCE_SPOT_BTC_USDT - 1HRS Candlestick Chart with Volume"
        );
        assert_eq!(layout["height"], 700);
        assert!(layout.get("template").is_none());
        assert_eq!(layout["paper_bgcolor"], "white");
        assert_eq!(layout["plot_bgcolor"], "white");
        assert_eq!(layout["xaxis"]["rangeslider"]["visible"], false);
        assert_relative_eq!(layout["yaxis2"]["domain"][1].as_f64().unwrap(), 0.27, epsilon = 1e-9);
        assert_relative_eq!(layout["yaxis"]["domain"][0].as_f64().unwrap(), 0.37, epsilon = 1e-9);
    }

    #[test]
    fn test_empty_series() {
        let payload = build_chart(&meta(), &[]);
        assert_eq!(payload.job_info.records, 0);
        assert!(payload.plot_data["data"][0]["x"].as_array().unwrap().is_empty());
    }
}
