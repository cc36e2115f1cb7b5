//! Provider error types.

use candlefetch_types::CandlefetchError;
use thiserror::Error;

/// Errors that can occur while talking to a market-data provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status.
    #[error("API Error: {status} - {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// The provider answered successfully but returned no candles.
    #[error("No data received from API")]
    NoData,

    /// The response could not be decoded into the expected shape.
    #[error("Unexpected response from provider: {0}")]
    Decode(String),

    /// The request parameters were invalid.
    #[error(transparent)]
    Request(#[from] CandlefetchError),

    /// No provider is registered under the requested name.
    #[error("Unsupported platform '{platform}'. Available: {available}")]
    UnsupportedPlatform {
        /// The requested platform name.
        platform: String,
        /// Comma-separated registered platform names.
        available: String,
    },
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
