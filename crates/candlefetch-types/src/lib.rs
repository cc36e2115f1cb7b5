//! Core types for the candlefetch candle downloader.
//!
//! This crate provides the fundamental data structures used throughout candlefetch:
//!
//! - [`Candle`] - A normalized OHLCV row with estimated buy/sell volume split
//! - [`Period`] - Candle resolution identifier (e.g. `1DAY`, `5min`)
//! - [`TimeWindow`] - Optional start/end bounds for a history request
//! - [`Exchange`], [`SymbolInfo`], [`Resolution`] - Provider metadata

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod candle;
mod error;
mod market;
mod period;
mod window;

pub use candle::Candle;
pub use error::{CandlefetchError, Result};
pub use market::{Exchange, Resolution, SymbolInfo};
pub use period::{Period, PeriodUnit};
pub use window::TimeWindow;
