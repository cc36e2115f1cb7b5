//! Platform-name registry.

use std::sync::Arc;

use crate::{CandleProvider, CoinApiProvider, CoinalyzeProvider, ProviderConfig, ProviderError};

/// Registered platform names, in lookup order.
pub const PLATFORMS: &[&str] = &["coinapi", "coinalyze"];

/// Creates the provider registered under `platform` (case-insensitive).
///
/// # Errors
///
/// Returns [`ProviderError::UnsupportedPlatform`] for unknown names, or an
/// error if the provider's HTTP client cannot be built.
pub fn create_provider(
    platform: &str,
    config: &ProviderConfig,
) -> Result<Arc<dyn CandleProvider>, ProviderError> {
    match platform.trim().to_lowercase().as_str() {
        "coinapi" => Ok(Arc::new(CoinApiProvider::new(config)?)),
        "coinalyze" => Ok(Arc::new(CoinalyzeProvider::new(config)?)),
        _ => Err(ProviderError::UnsupportedPlatform {
            platform: platform.to_string(),
            available: PLATFORMS.join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_platforms() {
        let config = ProviderConfig::new("key");
        assert_eq!(create_provider("CoinAPI", &config).unwrap().platform_name(), "CoinAPI");
        assert_eq!(create_provider("coinalyze", &config).unwrap().platform_name(), "Coinalyze");
    }

    #[test]
    fn test_unknown_platform() {
        let err = create_provider("binance", &ProviderConfig::new("key")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported platform 'binance'. Available: coinapi, coinalyze"
        );
    }
}
