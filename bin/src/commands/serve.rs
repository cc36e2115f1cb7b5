//! Serve command implementation.

use anyhow::{Context, Result};
use candlefetch_server::ServerConfig;
use tracing::info;

/// Run the API server until Ctrl-C.
pub(crate) async fn serve(config: ServerConfig) -> Result<()> {
    info!(addr = %config.addr(), platform = %config.platform, "starting candlefetch server");
    candlefetch_server::serve(config)
        .await
        .context("Server failed")
}
