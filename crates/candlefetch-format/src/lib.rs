//! CSV persistence and chart payloads for the candlefetch candle downloader.
//!
//! - [`write_candles`] / [`read_candles`] - Async CSV persistence
//! - [`build_chart`] - Plotly-compatible candlestick + volume figure

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chart;
mod csv;
mod error;

pub use crate::csv::{CSV_HEADER, read_candles, read_candles_from, write_candles, write_candles_to};
pub use chart::{ChartMeta, ChartPayload, JobInfo, MAX_CHART_CANDLES, build_chart};
pub use error::FormatError;
