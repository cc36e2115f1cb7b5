//! Provider metadata listings.

use anyhow::{Context, Result};
use candlefetch_provider::{CandleProvider, create_provider};
use candlefetch_server::ServerConfig;
use std::sync::Arc;

fn provider(config: &ServerConfig) -> Result<Arc<dyn CandleProvider>> {
    let provider_config = config.provider_config()?;
    create_provider(&config.platform, &provider_config).context("Failed to create provider")
}

/// List exchanges known to the provider.
pub(crate) async fn list_exchanges(config: &ServerConfig) -> Result<()> {
    let provider = provider(config)?;
    let exchanges = provider
        .list_exchanges()
        .await
        .context("Failed to fetch exchanges")?;

    if exchanges.is_empty() {
        println!("No exchanges found.");
        return Ok(());
    }

    println!("{:<20} {:<30} {:>18}", "ID", "NAME", "VOLUME 24H (USD)");
    println!("{}", "-".repeat(70));
    for exchange in &exchanges {
        println!(
            "{:<20} {:<30} {:>18}",
            exchange.exchange_id,
            exchange.name.as_deref().unwrap_or("-"),
            exchange
                .volume_1day_usd
                .map_or_else(|| "-".to_string(), |v| format!("{v:.0}")),
        );
    }

    println!("\nTotal: {} exchanges ({})", exchanges.len(), provider.platform_name());
    Ok(())
}

/// List symbols matching the search and exchange filters.
pub(crate) async fn list_symbols(config: &ServerConfig, search: &str, exchange: &str) -> Result<()> {
    let provider = provider(config)?;
    let symbols = provider
        .list_symbols(search, exchange)
        .await
        .context("Failed to fetch symbols")?;

    if symbols.is_empty() {
        println!("No symbols found.");
        return Ok(());
    }

    println!("{:<30} {:<15} {:<8} {:<8}", "SYMBOL", "EXCHANGE", "BASE", "QUOTE");
    println!("{}", "-".repeat(64));
    for symbol in &symbols {
        println!(
            "{:<30} {:<15} {:<8} {:<8}",
            symbol.symbol_id, symbol.exchange_id, symbol.asset_id_base, symbol.asset_id_quote
        );
    }

    println!("\nTotal: {} symbols", symbols.len());
    Ok(())
}

/// List the resolutions the provider accepts as a period.
pub(crate) async fn list_resolutions(config: &ServerConfig) -> Result<()> {
    let provider = provider(config)?;
    let resolutions = provider
        .list_resolutions()
        .await
        .context("Failed to fetch resolutions")?;

    println!("{:<10} {:<20} {:<10}", "ID", "NAME", "CATEGORY");
    println!("{}", "-".repeat(42));
    for resolution in &resolutions {
        println!(
            "{:<10} {:<20} {:<10}",
            resolution.id, resolution.name, resolution.category
        );
    }

    println!("\nTotal: {} resolutions", resolutions.len());
    Ok(())
}
