//! HTTP and WebSocket API for the candlefetch candle downloader.
//!
//! - [`ServerConfig`] - Environment-driven settings
//! - [`AppState`] - Store, runner, provider and event bus shared by handlers
//! - [`router`] - The axum route table
//! - [`serve`] - Binds and runs the server until Ctrl-C
//! - [`init_logging`] - `tracing-subscriber` setup

#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod logging;
mod routes;
mod state;

pub use config::{API_KEY_PLACEHOLDER, ServerConfig};
pub use error::{ApiError, ConfigError, ServerError};
pub use logging::{LogFormat, init_logging};
pub use routes::router;
pub use state::AppState;

use tokio::net::TcpListener;
use tracing::{error, info};

/// Builds the application state from `config` and serves until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the state cannot be built, the address cannot be
/// bound, or the server stops abnormally.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let state = AppState::build(&config)?;
    let addr = config.addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: addr.clone(),
            source,
        })?;

    info!(
        %addr,
        platform = state.provider().platform_name(),
        jobs = state.store().len(),
        data_dir = %config.data_dir.display(),
        "candlefetch server listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Serve)?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
