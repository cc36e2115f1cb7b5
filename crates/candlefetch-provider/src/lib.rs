//! Market-data provider clients for the candlefetch candle downloader.
//!
//! This crate provides the data-provider side of a download:
//!
//! - [`CandleProvider`] - Capability trait implemented by every provider
//! - [`CandleRequest`] - Symbol, period, window and limit for one fetch
//! - [`CoinApiProvider`] - CoinAPI REST implementation
//! - [`CoinalyzeProvider`] - Coinalyze REST implementation
//! - [`create_provider`] - Platform-name registry

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod client;
pub mod coinalyze;
pub mod coinapi;
mod error;
mod provider;
mod registry;

pub use client::ProviderConfig;
pub use coinalyze::CoinalyzeProvider;
pub use coinapi::CoinApiProvider;
pub use error::ProviderError;
pub use provider::{CandleProvider, CandleRequest};
pub use registry::{PLATFORMS, create_provider};
