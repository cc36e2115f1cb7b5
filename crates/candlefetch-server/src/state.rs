//! Shared application state.

use candlefetch_jobs::{JobEventBus, JobRunner, JobStore};
use candlefetch_provider::{CandleProvider, create_provider};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::{ServerConfig, ServerError};

/// Everything a handler needs, constructed once at startup.
///
/// Cloning is cheap; all clones share the same store, provider and bus.
#[derive(Debug, Clone)]
pub struct AppState {
    runner: JobRunner,
    bus: JobEventBus,
}

impl AppState {
    /// Opens the store, builds the configured provider and wires the runner.
    ///
    /// # Errors
    ///
    /// Returns an error if the API key is missing, the platform is unknown,
    /// or either folder cannot be created.
    pub fn build(config: &ServerConfig) -> Result<Self, ServerError> {
        let provider = create_provider(&config.platform, &config.provider_config()?)?;

        std::fs::create_dir_all(&config.data_dir).map_err(|source| ServerError::DataDir {
            path: config.data_dir.clone(),
            source,
        })?;
        let store = Arc::new(JobStore::open(config.store_path())?);
        info!(
            path = %store.path().display(),
            jobs = store.len(),
            "job store opened"
        );

        Ok(Self::new(store, provider, config.data_dir.clone()))
    }

    /// Wires already-constructed parts together.
    #[must_use]
    pub fn new(
        store: Arc<JobStore>,
        provider: Arc<dyn CandleProvider>,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        let bus = JobEventBus::default();
        let runner = JobRunner::new(store, provider, Arc::new(bus.clone()), data_dir);
        Self { runner, bus }
    }

    /// Returns the job runner.
    #[must_use]
    pub const fn runner(&self) -> &JobRunner {
        &self.runner
    }

    /// Returns the job store.
    #[must_use]
    pub const fn store(&self) -> &Arc<JobStore> {
        self.runner.store()
    }

    /// Returns the configured provider.
    #[must_use]
    pub const fn provider(&self) -> &Arc<dyn CandleProvider> {
        self.runner.provider()
    }

    /// Returns the job event bus.
    #[must_use]
    pub const fn bus(&self) -> &JobEventBus {
        &self.bus
    }
}
